use axum::http::StatusCode;
use thiserror::Error;

/// Every failure a caller can observe from the business layer.
///
/// The variant name, rendered in `SCREAMING_SNAKE_CASE`, is the stable error
/// code sent to clients; the `Display` text is the human readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, strum::IntoStaticStr, strum::EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[error("member not found")]
    NotFoundMember,
    #[error("project not found")]
    NotFoundProject,
    #[error("tech stack not found")]
    NotFoundTechStack,
    #[error("comment not found")]
    NotFoundComment,
    #[error("chat room not found")]
    NotFoundChatRoom,
    #[error("image not found")]
    NotFoundImage,
    #[error("member is not the author of this project")]
    NotMatchMemberProject,
    #[error("member is not the author of this comment")]
    NotMatchMemberComment,
    #[error("member does not participate in this project")]
    NotProjectMember,
    #[error("project is not recruiting")]
    ProjectNotRecruiting,
    #[error("project has no open positions")]
    ProjectFull,
    #[error("member already joined this project")]
    AlreadyJoinedProject,
    #[error("project status cannot go back to recruiting")]
    InvalidProjectStatus,
    #[error("unsupported image type")]
    MissMatchImageType,
    #[error("image upload failed")]
    ImageUploadFail,
    #[error("nickname is already taken")]
    ExistTrueMemberNickname,
    #[error("email is already registered")]
    ExistTrueMemberEmail,
    #[error("unsupported login provider")]
    UnsupportedProvider,
    #[error("invalid token")]
    InvalidToken,
    #[error("token is expired")]
    ExpiredToken,
}

impl ErrorCode {
    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFoundMember
            | ErrorCode::NotFoundProject
            | ErrorCode::NotFoundTechStack
            | ErrorCode::NotFoundComment
            | ErrorCode::NotFoundChatRoom
            | ErrorCode::NotFoundImage => StatusCode::NOT_FOUND,
            ErrorCode::NotMatchMemberProject
            | ErrorCode::NotMatchMemberComment
            | ErrorCode::NotProjectMember => StatusCode::FORBIDDEN,
            ErrorCode::ProjectNotRecruiting
            | ErrorCode::ProjectFull
            | ErrorCode::AlreadyJoinedProject
            | ErrorCode::ExistTrueMemberNickname
            | ErrorCode::ExistTrueMemberEmail => StatusCode::CONFLICT,
            ErrorCode::InvalidProjectStatus
            | ErrorCode::MissMatchImageType
            | ErrorCode::UnsupportedProvider => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidToken | ErrorCode::ExpiredToken => StatusCode::UNAUTHORIZED,
            ErrorCode::ImageUploadFail => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
