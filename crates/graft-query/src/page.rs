// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{ConnectionError, PageLimits};

/// Raw connection arguments as a client supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageArgs {
    pub first: Option<i64>,
    pub after: Option<String>,
    pub last: Option<i64>,
    pub before: Option<String>,
}

impl PageArgs {
    #[must_use]
    pub fn forward(first: i64, after: Option<String>) -> Self {
        Self {
            first: Some(first),
            after,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn backward(last: i64, before: Option<String>) -> Self {
        Self {
            last: Some(last),
            before,
            ..Self::default()
        }
    }

    /// Validates the arguments against `limits` and picks a direction.
    ///
    /// Forward and backward arguments cannot be mixed. With neither `first` nor `last`, a
    /// forward page of the default size is requested.
    pub fn resolve(&self, limits: &PageLimits) -> Result<PageRequest, ConnectionError> {
        let forward = self.first.is_some() || self.after.is_some();
        let backward = self.last.is_some() || self.before.is_some();
        if forward && backward {
            return Err(ConnectionError::InvalidArguments(
                "forward (first/after) and backward (last/before) arguments cannot be combined"
                    .to_string(),
            ));
        }
        if backward {
            let size = page_size("last", self.last, limits)?;
            return Ok(PageRequest::Backward {
                size,
                before: self.before.clone(),
            });
        }
        let size = page_size("first", self.first, limits)?;
        Ok(PageRequest::Forward {
            size,
            after: self.after.clone(),
        })
    }
}

fn page_size(
    arg: &'static str,
    requested: Option<i64>,
    limits: &PageLimits,
) -> Result<usize, ConnectionError> {
    let Some(requested) = requested else {
        return Ok(limits.default_page_size);
    };
    if requested <= 0 {
        return Err(ConnectionError::InvalidArguments(format!(
            "`{arg}` must be positive, got {requested}"
        )));
    }
    let size = usize::try_from(requested).unwrap_or(usize::MAX);
    if size > limits.max_page_size {
        return Err(ConnectionError::PageSizeExceeded {
            requested: size,
            max: limits.max_page_size,
        });
    }
    Ok(size)
}

/// Validated page request. Cursors are still opaque here; they are decoded against the
/// ordering when the page is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Forward { size: usize, after: Option<String> },
    Backward { size: usize, before: Option<String> },
}

impl PageRequest {
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Forward { size, .. } | Self::Backward { size, .. } => *size,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        match self {
            Self::Forward { after, .. } => after.as_deref(),
            Self::Backward { before, .. } => before.as_deref(),
        }
    }

    #[must_use]
    pub const fn is_backward(&self) -> bool {
        matches!(self, Self::Backward { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::ErrorCode;

    fn limits() -> PageLimits {
        PageLimits {
            max_page_size: 10,
            default_page_size: 3,
        }
    }

    #[test]
    fn ceiling_is_inclusive() {
        let ok = PageArgs::forward(10, None).resolve(&limits()).expect("ceiling");
        assert_eq!(ok.size(), 10);
        let err = PageArgs::forward(11, None)
            .resolve(&limits())
            .expect_err("above ceiling");
        assert_eq!(err.code(), ErrorCode::PageSizeExceeded);
    }

    #[test]
    fn mixed_directions_are_invalid() {
        let args = PageArgs {
            first: Some(2),
            last: Some(2),
            ..PageArgs::default()
        };
        assert_eq!(
            args.resolve(&limits()).expect_err("mixed").code(),
            ErrorCode::InvalidArguments
        );
        let args = PageArgs {
            after: Some("a".to_string()),
            before: Some("b".to_string()),
            ..PageArgs::default()
        };
        assert_eq!(
            args.resolve(&limits()).expect_err("mixed cursors").code(),
            ErrorCode::InvalidArguments
        );
    }

    #[test]
    fn non_positive_sizes_are_invalid() {
        for n in [0, -1] {
            let err = PageArgs::backward(n, None).resolve(&limits()).expect_err("size");
            assert_eq!(err.code(), ErrorCode::InvalidArguments);
        }
    }

    #[test]
    fn defaults_apply_without_size() {
        let req = PageArgs::default().resolve(&limits()).expect("default");
        assert_eq!(
            req,
            PageRequest::Forward {
                size: 3,
                after: None
            }
        );
        let req = PageArgs {
            before: Some("c".to_string()),
            ..PageArgs::default()
        }
        .resolve(&limits())
        .expect("before only");
        assert!(req.is_backward());
        assert_eq!(req.size(), 3);
        assert_eq!(req.cursor(), Some("c"));
    }
}
