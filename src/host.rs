use std::fmt;

use crate::error::SplitDiffError;

type AddCommentFn = Box<dyn FnMut(u32)>;
type ReportErrorFn = Box<dyn FnMut(&SplitDiffError)>;

/// Callbacks the embedding application hands to the view.
///
/// Both slots default to no-ops.
pub struct HostEmbedding {
    add_comment: AddCommentFn,
    report_error: ReportErrorFn,
}

impl Default for HostEmbedding {
    fn default() -> Self {
        Self {
            add_comment: Box::new(|_| {}),
            report_error: Box::new(|_| {}),
        }
    }
}

impl fmt::Debug for HostEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEmbedding").finish_non_exhaustive()
    }
}

impl HostEmbedding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with a diff index when a gutter is clicked.
    pub fn with_add_comment(mut self, add_comment: impl FnMut(u32) + 'static) -> Self {
        self.add_comment = Box::new(add_comment);
        self
    }

    pub fn with_report_error(
        mut self,
        report_error: impl FnMut(&SplitDiffError) + 'static,
    ) -> Self {
        self.report_error = Box::new(report_error);
        self
    }

    pub fn add_comment(&mut self, diff_idx: u32) {
        (self.add_comment)(diff_idx);
    }

    pub fn report_error(&mut self, error: &SplitDiffError) {
        (self.report_error)(error);
    }
}
