//! Request types, one per raw-client operation
//!
//! A request carries the identifying parameters of an operation plus the
//! [`RequestOptions`](crate::RequestOptions) bag. Decorators only ever see a
//! shared reference, so a request can be re-sent unchanged on retry.

macro_rules! request_options {
    ($($request:ty),+ $(,)?) => {
        $(
            impl $request {
                /// Replace the optional parameters of this request.
                #[must_use]
                pub fn with_options(mut self, options: $crate::RequestOptions) -> Self {
                    self.options = options;
                    self
                }
            }
        )+
    };
}

mod acl;
mod bucket;
mod notification;
mod object;

pub use acl::*;
pub use bucket::*;
pub use notification::*;
pub use object::*;

use crate::RequestOptions;

/// Fetch the Cloud Storage service account of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct GetProjectServiceAccountRequest {
    pub project_id: String,
    pub options: RequestOptions,
}

impl GetProjectServiceAccountRequest {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            options: RequestOptions::default(),
        }
    }
}

request_options!(GetProjectServiceAccountRequest);
