/// Local scene coordinates of an actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance; enough for nearest-first ordering.
    /// Saturates at `i64::MAX` for points at opposite ends of the i32 range.
    pub fn distance_sq(&self, other: &Point) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }
}

/// Animation id reported when an actor is doing nothing
pub const IDLE_ANIMATION: i32 = -1;

/// Animation played by the local player when a low level combat spell goes off
pub const LOW_LEVEL_MAGIC_ATTACK: i32 = 1162;

/// Attack style varp values that mean "autocast" / "defensive autocast"
pub const CASTING_STYLES: [i32; 2] = [3, 4];

/// Scene index of an NPC; stable while the NPC is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NpcHandle(pub u32);

/// What an actor is currently interacting with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interacting {
    None,
    LocalPlayer,
    Other,
}

/// One NPC as seen by the query collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    pub handle: NpcHandle,
    pub id: i32,
    pub position: Point,
    pub interacting: Interacting,
}

/// Source of an animation change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    LocalPlayer,
    Npc(NpcHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    LoginScreen,
    Loading,
    LoggedIn,
}

/// The local player as seen by the query collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub position: Point,
    pub animation: i32,
}

/// Context menu option an action resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    NpcSecondOption,
}

/// Instruction handed to the action collaborator; executed at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub target: NpcHandle,
    pub option: MenuOption,
}

/// Per-tick capture of everything the classifier is allowed to look at
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub moving: bool,
    pub animation: i32,
    pub spell_castable: bool,
    pub target: Option<NpcHandle>,
    pub position: Point,
    pub run_energy: u32,
    pub run_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    GameMessage,
    Engine,
    Public,
    Private,
    Broadcast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub kind: ChatKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationChanged {
    pub actor: Actor,
    pub animation: i32,
}

/// The environment is about to resolve a context menu action
#[derive(Debug, Clone, PartialEq)]
pub struct MenuOptionClicked {
    pub option: String,
    pub target: String,
}

/// Asynchronous events delivered between ticks
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    MenuOptionClicked(MenuOptionClicked),
    AnimationChanged(AnimationChanged),
    ChatMessage(ChatMessage),
}

/// A single changed config entry, as published by the host
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChanged {
    pub group: String,
    pub key: String,
    pub value: String,
}

/// Command from the front end to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Config(ConfigChanged),
    Status,
    Quit,
}
