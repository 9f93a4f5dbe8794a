use map_entity::{EntityEditorMode, EntityId};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScriptCommand {
    Activate(EntityId),
    ForceActivate(EntityId),
    Deactivate(EntityId),
    Trigger(String),
    Hover { id: EntityId, color: u32 },
    Unhover(EntityId),
    Near { id: EntityId, color: u32 },
    Far(EntityId),
    Move { id: EntityId, x: f32, y: f32 },
    Set { id: EntityId, key: String, value: Value },
    Delete(EntityId),
    Editor(bool),
    EditorMode(EntityEditorMode),
}

/// Non-empty, non-comment lines with their 1-based line numbers.
pub(crate) fn script_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

pub(crate) fn parse_command(line: &str) -> Result<ScriptCommand, String> {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match verb {
        "activate" => Ok(ScriptCommand::Activate(single_id(verb, &args)?)),
        "force-activate" => Ok(ScriptCommand::ForceActivate(single_id(verb, &args)?)),
        "deactivate" => Ok(ScriptCommand::Deactivate(single_id(verb, &args)?)),
        "trigger" => {
            if rest.is_empty() {
                return Err("trigger requires an action label".to_string());
            }
            Ok(ScriptCommand::Trigger(rest.to_string()))
        }
        "hover" => {
            let (id, color) = id_and_color(verb, &args)?;
            Ok(ScriptCommand::Hover { id, color })
        }
        "unhover" => Ok(ScriptCommand::Unhover(single_id(verb, &args)?)),
        "near" => {
            let (id, color) = id_and_color(verb, &args)?;
            Ok(ScriptCommand::Near { id, color })
        }
        "far" => Ok(ScriptCommand::Far(single_id(verb, &args)?)),
        "move" => {
            let [id, x, y] = args.as_slice() else {
                return Err("move expects <id> <x> <y>".to_string());
            };
            Ok(ScriptCommand::Move {
                id: EntityId::new(*id),
                x: parse_coordinate(x)?,
                y: parse_coordinate(y)?,
            })
        }
        "set" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let (Some(id), Some(key), Some(raw)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err("set expects <id> <key> <json>".to_string());
            };
            let value = serde_json::from_str(raw.trim())
                .map_err(|error| format!("invalid json for set: {error}"))?;
            Ok(ScriptCommand::Set {
                id: EntityId::new(id),
                key: key.to_string(),
                value,
            })
        }
        "delete" => Ok(ScriptCommand::Delete(single_id(verb, &args)?)),
        "editor" => match args.as_slice() {
            ["on"] => Ok(ScriptCommand::Editor(true)),
            ["off"] => Ok(ScriptCommand::Editor(false)),
            _ => Err("editor expects on|off".to_string()),
        },
        "editor-mode" => match args.as_slice() {
            ["add"] => Ok(ScriptCommand::EditorMode(EntityEditorMode::AddMode)),
            ["edit"] => Ok(ScriptCommand::EditorMode(EntityEditorMode::EditMode)),
            ["remove"] => Ok(ScriptCommand::EditorMode(EntityEditorMode::RemoveMode)),
            _ => Err("editor-mode expects add|edit|remove".to_string()),
        },
        other => Err(format!("unknown command '{other}'")),
    }
}

fn single_id(verb: &str, args: &[&str]) -> Result<EntityId, String> {
    match args {
        [id] => Ok(EntityId::new(*id)),
        _ => Err(format!("{verb} expects exactly one entity id")),
    }
}

fn id_and_color(verb: &str, args: &[&str]) -> Result<(EntityId, u32), String> {
    match args {
        [id, color] => Ok((EntityId::new(*id), parse_color(color)?)),
        _ => Err(format!("{verb} expects <id> <#rrggbb>")),
    }
}

fn parse_color(raw: &str) -> Result<u32, String> {
    let hex = raw
        .strip_prefix('#')
        .or_else(|| raw.strip_prefix("0x"))
        .unwrap_or(raw);
    if hex.len() != 6 {
        return Err(format!("invalid color '{raw}' (expected #rrggbb)"));
    }
    u32::from_str_radix(hex, 16).map_err(|_| format!("invalid color '{raw}' (expected #rrggbb)"))
}

fn parse_coordinate(raw: &str) -> Result<f32, String> {
    raw.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("invalid coordinate '{raw}'"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let lines = script_lines("# intro\n\nactivate desk\n   \n  trigger Join  \n");
        assert_eq!(lines, vec![(3, "activate desk"), (5, "trigger Join")]);
    }

    #[test]
    fn trigger_keeps_spaces_in_label() {
        assert_eq!(
            parse_command("trigger Join the meeting"),
            Ok(ScriptCommand::Trigger("Join the meeting".to_string()))
        );
    }

    #[test]
    fn colors_accept_hash_and_hex_prefixes() {
        assert_eq!(
            parse_command("hover desk #ff00ff"),
            Ok(ScriptCommand::Hover {
                id: EntityId::new("desk"),
                color: 0xff00ff
            })
        );
        assert_eq!(
            parse_command("near desk 0x00ff00"),
            Ok(ScriptCommand::Near {
                id: EntityId::new("desk"),
                color: 0x00ff00
            })
        );
        assert!(parse_command("hover desk #fff").is_err());
    }

    #[test]
    fn set_takes_remaining_text_as_json() {
        assert_eq!(
            parse_command(r#"set desk openTab {"buttonLabel": "Open", "link": "https://example.com"}"#),
            Ok(ScriptCommand::Set {
                id: EntityId::new("desk"),
                key: "openTab".to_string(),
                value: json!({"buttonLabel": "Open", "link": "https://example.com"}),
            })
        );
        assert!(parse_command("set desk textHeader {oops").is_err());
    }

    #[test]
    fn move_and_editor_commands_parse() {
        assert_eq!(
            parse_command("move desk 10 -4.5"),
            Ok(ScriptCommand::Move {
                id: EntityId::new("desk"),
                x: 10.0,
                y: -4.5
            })
        );
        assert_eq!(parse_command("editor on"), Ok(ScriptCommand::Editor(true)));
        assert_eq!(
            parse_command("editor-mode edit"),
            Ok(ScriptCommand::EditorMode(EntityEditorMode::EditMode))
        );
        assert!(parse_command("move desk nan 1").is_err());
    }

    #[test]
    fn unknown_verbs_and_bad_arity_are_reported() {
        assert_eq!(
            parse_command("dance desk"),
            Err("unknown command 'dance'".to_string())
        );
        assert_eq!(
            parse_command("activate"),
            Err("activate expects exactly one entity id".to_string())
        );
    }
}
