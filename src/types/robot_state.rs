use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pick controller lifecycle states, as reported in a robot's status token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RobotState {
    VacuumOn,
    VacuumOff,
    #[default]
    Error,
    Ready,
    PickCommandReceived,
    TargetFound,
    AtPickPositionXy,
    MovingAbovePick,
    AtPickPositionXyAboveZ,
    Probing,
    HasItem,
    RaisingArm,
    AtPickPositionZClearance,
    MovingToDropoffXy,
    AtDropoffXy,
    MovingToDropoffXyz,
    AtDropoffXyz,
    ItemPlaced,
    AtZClearanceReturn,
    WaitForMotion,
    ZeroReturn,
    ZeroReturnWait,
    NeedsZero,
    MoveToNewDropoff,
}

impl RobotState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VacuumOn => "PC_VAC_ON",
            Self::VacuumOff => "PC_VAC_OFF",
            Self::Error => "PC_ERROR",
            Self::Ready => "PC_READY",
            Self::PickCommandReceived => "PC_PICK_COMMAND_RECEIVED",
            Self::TargetFound => "PC_TARGET_FOUND",
            Self::AtPickPositionXy => "PC_AT_PICK_POSITION_XY",
            Self::MovingAbovePick => "PC_MOVING_ABOVE_PICK",
            Self::AtPickPositionXyAboveZ => "PC_AT_PICK_POSITION_XY_ABOVE_Z",
            Self::Probing => "PC_PROBING",
            Self::HasItem => "PC_HAS_ITEM",
            Self::RaisingArm => "PC_RAISING_ARM",
            Self::AtPickPositionZClearance => "PC_AT_PICK_POSITION_Z_CLEARANCE",
            Self::MovingToDropoffXy => "PC_MOVING_TO_DROPOFF_XY",
            Self::AtDropoffXy => "PC_AT_DROPOFF_XY",
            Self::MovingToDropoffXyz => "PC_MOVING_TO_DROPOFF_XYZ",
            Self::AtDropoffXyz => "PC_AT_DROPOFF_XYZ",
            Self::ItemPlaced => "PC_ITEM_PLACED",
            Self::AtZClearanceReturn => "PC_AT_Z_CLEARANCE_RETURN",
            Self::WaitForMotion => "PC_WAIT_FOR_MOTION",
            Self::ZeroReturn => "PC_ZERO_RETURN",
            Self::ZeroReturnWait => "PC_ZERO_RETURN_WAIT",
            Self::NeedsZero => "PC_NEEDS_ZERO",
            Self::MoveToNewDropoff => "PC_MOVE_TO_NEW_DROPOFF",
        }
    }

    /// Total mapping from a raw status token; anything unknown is an error.
    #[must_use]
    pub fn from_token(token: Option<&str>) -> Self {
        token
            .map(str::trim)
            .and_then(|value| value.parse().ok())
            .unwrap_or(Self::Error)
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    #[must_use]
    pub const fn is_at_dropoff(&self) -> bool {
        matches!(self, Self::AtDropoffXyz)
    }

    #[must_use]
    pub const fn needs_zero(&self) -> bool {
        matches!(self, Self::NeedsZero)
    }
}

impl FromStr for RobotState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "PC_VAC_ON" => Ok(Self::VacuumOn),
            "PC_VAC_OFF" => Ok(Self::VacuumOff),
            "PC_ERROR" => Ok(Self::Error),
            "PC_READY" => Ok(Self::Ready),
            "PC_PICK_COMMAND_RECEIVED" => Ok(Self::PickCommandReceived),
            "PC_TARGET_FOUND" => Ok(Self::TargetFound),
            "PC_AT_PICK_POSITION_XY" => Ok(Self::AtPickPositionXy),
            "PC_MOVING_ABOVE_PICK" => Ok(Self::MovingAbovePick),
            "PC_AT_PICK_POSITION_XY_ABOVE_Z" => Ok(Self::AtPickPositionXyAboveZ),
            "PC_PROBING" => Ok(Self::Probing),
            "PC_HAS_ITEM" => Ok(Self::HasItem),
            "PC_RAISING_ARM" => Ok(Self::RaisingArm),
            "PC_AT_PICK_POSITION_Z_CLEARANCE" => Ok(Self::AtPickPositionZClearance),
            "PC_MOVING_TO_DROPOFF_XY" => Ok(Self::MovingToDropoffXy),
            "PC_AT_DROPOFF_XY" => Ok(Self::AtDropoffXy),
            "PC_MOVING_TO_DROPOFF_XYZ" => Ok(Self::MovingToDropoffXyz),
            "PC_AT_DROPOFF_XYZ" => Ok(Self::AtDropoffXyz),
            "PC_ITEM_PLACED" => Ok(Self::ItemPlaced),
            "PC_AT_Z_CLEARANCE_RETURN" => Ok(Self::AtZClearanceReturn),
            "PC_WAIT_FOR_MOTION" => Ok(Self::WaitForMotion),
            "PC_ZERO_RETURN" => Ok(Self::ZeroReturn),
            "PC_ZERO_RETURN_WAIT" => Ok(Self::ZeroReturnWait),
            "PC_NEEDS_ZERO" => Ok(Self::NeedsZero),
            "PC_MOVE_TO_NEW_DROPOFF" => Ok(Self::MoveToNewDropoff),
            _ => Err(format!("Unknown robot state: {s}")),
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
