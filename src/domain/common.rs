use uuid::Uuid;

/// Shared behaviour for entities addressable by a stable identifier.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Shared behaviour for entities that can render a short human label.
pub trait Displayable {
    fn display_label(&self) -> String;
}
