use super::RewritePolicy;
use crate::handle::CogHandle;

/// Never rewrites; every scan pays for the structure as it stands
#[derive(Debug, Clone, Copy, Default)]
pub struct NaivePolicy;

impl RewritePolicy for NaivePolicy {
    fn before_iterator(&self, _handle: &CogHandle) {}

    fn name(&self) -> &'static str {
        "Naive"
    }
}
