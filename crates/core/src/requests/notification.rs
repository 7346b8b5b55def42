use crate::RequestOptions;
use crate::resources::NotificationMetadata;

#[derive(Debug, Clone, PartialEq)]
pub struct ListNotificationsRequest {
    pub bucket_name: String,
    pub options: RequestOptions,
}

impl ListNotificationsRequest {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateNotificationRequest {
    pub bucket_name: String,
    pub metadata: NotificationMetadata,
    pub options: RequestOptions,
}

impl CreateNotificationRequest {
    pub fn new(bucket_name: impl Into<String>, metadata: NotificationMetadata) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            metadata,
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetNotificationRequest {
    pub bucket_name: String,
    pub notification_id: String,
    pub options: RequestOptions,
}

impl GetNotificationRequest {
    pub fn new(bucket_name: impl Into<String>, notification_id: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            notification_id: notification_id.into(),
            options: RequestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteNotificationRequest {
    pub bucket_name: String,
    pub notification_id: String,
    pub options: RequestOptions,
}

impl DeleteNotificationRequest {
    pub fn new(bucket_name: impl Into<String>, notification_id: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            notification_id: notification_id.into(),
            options: RequestOptions::default(),
        }
    }
}

request_options!(
    ListNotificationsRequest,
    CreateNotificationRequest,
    GetNotificationRequest,
    DeleteNotificationRequest,
);
