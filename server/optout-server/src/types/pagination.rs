//! Pagination parameters shared by every admin list endpoint

use database_layer::{PageRequest, Paged};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::{api_success_with_meta, ApiResponse, PaginationInfo, ResponseMetadata};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=2&page_size=50`
#[derive(Debug, Deserialize, IntoParams, ToSchema, Clone, Copy, Default)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,

    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Page number, 1-based (defaults to 1)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size (defaults to 20, clamped between 1 and 100)
    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.page_size())
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size())
    }

    pub fn to_page_request(&self) -> PageRequest {
        PageRequest::new(self.offset(), self.limit())
    }

    /// Total pages for `total_count` rows; an empty result is one page.
    pub fn total_pages(&self, total_count: i64) -> u32 {
        if total_count <= 0 {
            return 1;
        }
        let size = i64::from(self.page_size());
        u32::try_from((total_count + size - 1) / size).unwrap_or(u32::MAX)
    }

    pub fn to_metadata(&self, total_count: i64) -> ResponseMetadata {
        let total_pages = self.total_pages(total_count);

        ResponseMetadata {
            pagination: Some(PaginationInfo {
                page: self.page(),
                page_size: self.page_size(),
                total_pages,
                has_next: self.page() < total_pages,
                has_previous: self.page() > 1,
            }),
            total_count: Some(total_count),
        }
    }

    /// Wrap one page of storage results with pagination metadata
    pub fn wrap_response<T>(&self, paged: Paged<T>) -> ApiResponse<Vec<T>> {
        let metadata = self.to_metadata(paged.total);
        api_success_with_meta(paged.items, metadata)
    }
}
