//! Domain methods for the mediabox API client.
//!
//! Response types come from `mediabox_core::models`; this module only maps
//! endpoints to them.

use mediabox_core::constants::{endpoints, is_success_status, DEFAULT_PAGE, DEFAULT_PAGE_LIMIT};
use mediabox_core::models::{
    MediaItem, RawMediaDto, UploadOutcome, UploadResponse, VideoStatus, VideoStatusResponse,
};
use mediabox_core::{validate_upload, ClientError, OAuthProvider, PendingUpload};

use crate::http::{ApiRequest, MultipartFile};
use crate::poller::{PollHandle, VideoStatusPoller};
use crate::ApiClient;

/// Page/limit query for the feed endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageQuery {
    fn params(&self) -> [(&'static str, String); 2] {
        [("page", self.page.to_string()), ("limit", self.limit.to_string())]
    }
}

impl ApiClient {
    /// Everyone's uploads, newest first as ordered by the backend.
    pub async fn list_all_media(&self, query: PageQuery) -> Result<Vec<MediaItem>, ClientError> {
        self.list_media(endpoints::GET_ALL_MEDIA, query).await
    }

    /// Uploads of the authenticated user.
    pub async fn list_user_media(&self, query: PageQuery) -> Result<Vec<MediaItem>, ClientError> {
        self.list_media(endpoints::GET_USER_MEDIA, query).await
    }

    async fn list_media(&self, path: &str, query: PageQuery) -> Result<Vec<MediaItem>, ClientError> {
        let response = self
            .request(ApiRequest::get(path).with_query(&query.params()))
            .await?;
        // The feed is a bare array; a null or empty body means no media.
        let items: Option<Vec<RawMediaDto>> = response.json_or_default()?;
        Ok(items
            .unwrap_or_default()
            .into_iter()
            .map(MediaItem::from)
            .collect())
    }

    /// Upload an image or video as multipart field `file`.
    ///
    /// Type and size are checked again before anything is sent.
    pub async fn upload_media(&self, upload: &PendingUpload) -> Result<UploadOutcome, ClientError> {
        let kind = validate_upload(&upload.content_type, upload.size())?;
        let path = match kind {
            mediabox_core::models::MediaKind::Image => endpoints::UPLOAD_IMAGE,
            mediabox_core::models::MediaKind::Video => endpoints::UPLOAD_VIDEO,
        };

        tracing::info!(
            filename = %upload.filename,
            kind = %kind,
            size = upload.size(),
            "Uploading media"
        );

        let request = ApiRequest::post(path).with_multipart(MultipartFile {
            field: "file".to_string(),
            filename: upload.filename.clone(),
            content_type: upload.content_type.clone(),
            data: upload.data.clone(),
        });
        let response = self.request(request).await?;

        if !is_success_status(response.status) {
            return Err(response.into_error());
        }

        let body: UploadResponse = response.json_or_default()?;
        Ok(UploadOutcome {
            kind,
            status: response.status,
            response: body,
        })
    }

    /// Current processing status of an uploaded video.
    pub async fn get_video_status(&self, video_uuid: &str) -> Result<VideoStatus, ClientError> {
        if video_uuid.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Video id must not be empty".to_string(),
            ));
        }
        let path = format!(
            "{}{}",
            endpoints::GET_VIDEO_STATUS,
            urlencoding::encode(video_uuid)
        );
        let body: VideoStatusResponse = self.get(&path, &[]).await?;
        Ok(body.status)
    }

    /// Browser redirect target for an OAuth login.
    pub fn oauth_login_url(&self, provider: OAuthProvider) -> Result<String, ClientError> {
        self.config().oauth_login_url(provider)
    }

    /// Upload, and start tracking processing when the backend returns a video job.
    ///
    /// Any poll still running on `poller` is stopped before the upload is sent.
    pub async fn upload_and_track(
        &self,
        upload: &PendingUpload,
        poller: &VideoStatusPoller,
    ) -> Result<(UploadOutcome, Option<PollHandle>), ClientError> {
        poller.stop();

        let outcome = self.upload_media(upload).await?;
        let handle = outcome.video_job().map(|job| poller.start(job));
        Ok((outcome, handle))
    }
}
