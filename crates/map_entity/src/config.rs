pub const DEFAULT_ACTIVATION_RADIUS: f32 = 96.0;
pub const DEFAULT_OUTLINE_THICKNESS: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    /// Distance in world pixels within which a character can activate an entity.
    pub activation_radius: f32,
    pub outline_thickness: u32,
    pub interactive_cursor: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            activation_radius: DEFAULT_ACTIVATION_RADIUS,
            outline_thickness: DEFAULT_OUTLINE_THICKNESS,
            interactive_cursor: "pointer".to_string(),
        }
    }
}
