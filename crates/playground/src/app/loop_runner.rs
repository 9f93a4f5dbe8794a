use std::fs;
use std::process::ExitCode;
use std::rc::Rc;

use map_entity::{
    load_map_entity_file, ActionsMenuHandle, EditorModeHandle, Entity, EntityContext, EntityEvent,
    EntityEventQueue, EntityId, EntityWorld, InteractionConfig,
};
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::headless::{HeadlessCoWebsites, HeadlessHost};
use super::script::{parse_command, script_lines, ScriptCommand};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let map = match load_map_entity_file(&app.map_path) {
        Ok(map) => map,
        Err(err) => {
            error!(error = %err, "map_load_failed");
            return ExitCode::FAILURE;
        }
    };

    let host = Rc::new(HeadlessHost::default());
    let co_websites = Rc::new(HeadlessCoWebsites::default());
    let mut world = build_world(app.config, Rc::clone(&host), Rc::clone(&co_websites));
    for data in map.entities {
        if let Err(err) = world.spawn(data) {
            error!(error = %err, "map_spawn_failed");
            return ExitCode::FAILURE;
        }
    }
    info!(
        map = %app.map_path.display(),
        entity_count = world.entity_count(),
        "map_loaded"
    );

    if let Some(script_path) = &app.script_path {
        let content = match fs::read_to_string(script_path) {
            Ok(content) => content,
            Err(err) => {
                error!(script = %script_path.display(), error = %err, "script_read_failed");
                world.clear();
                return ExitCode::FAILURE;
            }
        };
        let failures = run_script(&mut world, &content);
        info!(script = %script_path.display(), failures, "script_finished");
    }

    world.clear();
    info!(
        redraws = host.dirty_marks(),
        live_renderables = host.renderable_count(),
        co_websites_opened = co_websites.opened().len(),
        "shutdown"
    );
    ExitCode::SUCCESS
}

fn build_world(
    config: InteractionConfig,
    host: Rc<HeadlessHost>,
    co_websites: Rc<HeadlessCoWebsites>,
) -> EntityWorld {
    EntityWorld::new(EntityContext {
        host,
        co_websites,
        actions_menu: ActionsMenuHandle::default(),
        editor_mode: EditorModeHandle::default(),
        events: EntityEventQueue::default(),
        config,
    })
}

/// Runs every script line; failing lines are logged and skipped.
fn run_script(world: &mut EntityWorld, content: &str) -> usize {
    let mut failures = 0usize;
    for (line_number, line) in script_lines(content) {
        let outcome = parse_command(line).and_then(|command| execute(world, command));
        if let Err(message) = outcome {
            failures += 1;
            warn!(line = line_number, command = line, error = %message, "script_command_failed");
        }
        for event in world.process_events() {
            log_event(&event);
        }
    }
    failures
}

fn execute(world: &mut EntityWorld, command: ScriptCommand) -> Result<(), String> {
    match command {
        ScriptCommand::Activate(id) => {
            let outcome = entity_mut(world, &id)?
                .activate()
                .map_err(|err| err.to_string())?;
            info!(entity_id = %id, outcome = ?outcome, "activate");
        }
        ScriptCommand::ForceActivate(id) => {
            let outcome = entity_mut(world, &id)?
                .force_activate()
                .map_err(|err| err.to_string())?;
            info!(entity_id = %id, outcome = ?outcome, "force_activate");
        }
        ScriptCommand::Deactivate(id) => entity_mut(world, &id)?.deactivate(),
        ScriptCommand::Trigger(label) => {
            if !world.context().actions_menu.trigger(&label) {
                return Err(format!("no open menu action named '{label}'"));
            }
        }
        ScriptCommand::Hover { id, color } => entity_mut(world, &id)?.pointer_over_outline(color),
        ScriptCommand::Unhover(id) => entity_mut(world, &id)?.pointer_out_outline(),
        ScriptCommand::Near { id, color } => {
            entity_mut(world, &id)?.character_close_by_outline(color)
        }
        ScriptCommand::Far(id) => entity_mut(world, &id)?.character_far_away_outline(),
        ScriptCommand::Move { id, x, y } => entity_mut(world, &id)?
            .move_to(x, y)
            .map_err(|err| err.to_string())?,
        ScriptCommand::Set { id, key, value } => {
            entity_mut(world, &id)?.set_property_json(key, value)
        }
        ScriptCommand::Delete(id) => entity_mut(world, &id)?.delete(),
        ScriptCommand::Editor(active) => world.context().editor_mode.set_editor_active(active),
        ScriptCommand::EditorMode(mode) => world.context().editor_mode.set_entity_mode(mode),
    }
    Ok(())
}

fn entity_mut<'a>(world: &'a mut EntityWorld, id: &EntityId) -> Result<&'a mut Entity, String> {
    world
        .find_mut(id)
        .ok_or_else(|| format!("unknown entity '{id}'"))
}

fn log_event(event: &EntityEvent) {
    match event {
        EntityEvent::Moved {
            entity_id,
            from_top_left,
            to,
        } => info!(
            entity_id = %entity_id,
            from_x = from_top_left.x,
            from_y = from_top_left.y,
            to_x = to.x,
            to_y = to.y,
            "entity_moved"
        ),
        EntityEvent::Remove { entity_id } => info!(entity_id = %entity_id, "entity_removed"),
        EntityEvent::PropertiesUpdated {
            entity_id, key, ..
        } => info!(entity_id = %entity_id, key = key.as_str(), "entity_properties_updated"),
        EntityEvent::PropertyActivated {
            entity_id,
            properties,
        } => {
            for property in properties {
                info!(
                    entity_id = %entity_id,
                    property = property.property_name.as_str(),
                    value = property.property_value.as_str(),
                    "property_activated"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use map_entity::{parse_map_entity_file, EntityState};

    use super::*;

    const MAP: &str = r#"{
        "version": 1,
        "entities": [
            {
                "id": "desk",
                "x": 64,
                "y": 64,
                "interactive": true,
                "prefab": {"name": "Desk", "imagePath": "office/desk.png"},
                "properties": {
                    "textHeader": "Desk",
                    "jitsiRoom": {"buttonLabel": "Join", "roomName": "desk-room"},
                    "openTab": {"buttonLabel": "Docs", "link": "ftp://files.example/doc", "inNewTab": false}
                }
            },
            {
                "id": "plant",
                "x": 0,
                "y": 0,
                "prefab": {"name": "Plant", "imagePath": "office/plant.png"}
            }
        ]
    }"#;

    fn world_with_map() -> (EntityWorld, Rc<HeadlessHost>, Rc<HeadlessCoWebsites>) {
        let host = Rc::new(HeadlessHost::default());
        let co_websites = Rc::new(HeadlessCoWebsites::default());
        let mut world = build_world(
            InteractionConfig::default(),
            Rc::clone(&host),
            Rc::clone(&co_websites),
        );
        for data in parse_map_entity_file(MAP).expect("map").entities {
            world.spawn(data).expect("spawn");
        }
        (world, host, co_websites)
    }

    #[test]
    fn script_drives_menu_outline_and_removal() {
        let (mut world, host, co_websites) = world_with_map();
        let script = "\
# open the desk menu and join the room
activate desk
trigger Join
trigger Docs
hover desk #ff0000
delete plant
";
        let failures = run_script(&mut world, script);
        assert_eq!(failures, 0);
        assert_eq!(world.entity_count(), 1);
        assert!(host.renderable(&EntityId::new("plant")).is_none());
        let desk = host.renderable(&EntityId::new("desk")).expect("desk renderable");
        assert_eq!(desk.outline.map(|style| style.color), Some(0xff0000));
        assert_eq!(desk.cursor.as_deref(), Some("pointer"));
        assert!(co_websites.opened().is_empty());
    }

    #[test]
    fn editor_edit_mode_blocks_activation() {
        let (mut world, _host, _co_websites) = world_with_map();
        let failures = run_script(&mut world, "editor on\neditor-mode edit\nactivate desk\n");
        assert_eq!(failures, 0);
        let desk = world.find(&EntityId::new("desk")).expect("desk");
        assert_eq!(desk.state(), EntityState::Interactive { menu_open: false });
    }

    #[test]
    fn failing_lines_are_counted_and_skipped() {
        let (mut world, _host, _co_websites) = world_with_map();
        let failures = run_script(
            &mut world,
            "activate ghost\ntrigger Nothing\nbogus\nforce-activate desk\n",
        );
        assert_eq!(failures, 3);
        assert!(world.context().actions_menu.is_open());
    }

    #[test]
    fn bundled_office_demo_runs_cleanly() {
        let host = Rc::new(HeadlessHost::default());
        let co_websites = Rc::new(HeadlessCoWebsites::default());
        let mut world = build_world(
            InteractionConfig::default(),
            Rc::clone(&host),
            Rc::clone(&co_websites),
        );
        let map = parse_map_entity_file(include_str!("../../demos/office.map.json"))
            .expect("demo map");
        for data in map.entities {
            world.spawn(data).expect("spawn");
        }

        let failures = run_script(&mut world, include_str!("../../demos/office.script"));
        assert_eq!(failures, 0);
        assert_eq!(co_websites.opened(), vec!["https://example.com/agenda".to_string()]);
        assert!(world.find(&EntityId::new("plant")).is_none());
        let radio = host.renderable(&EntityId::new("radio")).expect("radio renderable");
        assert_eq!(radio.position, map_entity::Vec2 { x: 128.0, y: 64.0 });
    }
}
