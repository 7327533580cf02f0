use armature_graph::Node;

/// Node classification relative to the prior plan baseline, written into
/// node metadata by the upstream planner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeltaStatus {
    #[default]
    Existing,
    Modified,
    New,
}

impl DeltaStatus {
    pub const METADATA_KEY: &'static str = "delta_status";

    /// Reads the classification from node metadata. Absent or unrecognized
    /// values mean the node is unchanged and produces no work.
    pub fn of(node: &Node) -> Self {
        match node.metadata.get(Self::METADATA_KEY).map(String::as_str) {
            Some("new") => Self::New,
            Some("modified") => Self::Modified,
            _ => Self::Existing,
        }
    }

    pub fn is_actionable(self) -> bool {
        matches!(self, Self::Modified | Self::New)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Modified => "modified",
            Self::New => "new",
        }
    }
}

/// Stage lifecycle vocabulary of the workflow wire format, with the
/// canonical display color per status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Active,
    ImplComplete,
    Validated,
    Failed,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::ImplComplete => "impl_complete",
            Self::Validated => "validated",
            Self::Failed => "failed",
        }
    }

    pub fn fill_color(self) -> &'static str {
        match self {
            Self::Pending => "lightyellow",
            Self::Active => "lightblue",
            Self::ImplComplete => "lightsalmon",
            Self::Validated => "lightgreen",
            Self::Failed => "lightcoral",
        }
    }
}
