pub mod geometry;
pub mod phase;
pub mod scene;
pub mod sensor;
pub mod trial;

pub use geometry::{Pose, Vec3};
pub use phase::TrialPhase;
pub use scene::{EntityBinding, EntityId, EntityLookup, PoseSource, Scene};
pub use sensor::{Hit, NO_HIT_SENTINEL, RayCaster};
pub use trial::{EndReason, Sample, TrialSummary};
