mod painter;
mod table;
mod transcript_view;
mod upload_view;

pub(crate) use self::painter::Painter;
pub(crate) use self::transcript_view::TranscriptView;
pub(crate) use self::upload_view::UploadReportView;
