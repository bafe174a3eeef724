pub mod comment;
pub mod edge;
pub mod playlist;
pub mod user;
pub mod video;

pub use comment::{Comment, NewComment};
pub use edge::{EdgeKey, Relation, TargetKind, ToggleEdge};
pub use playlist::{NewPlaylist, Playlist};
pub use user::{NewUser, User};
pub use video::{NewVideo, SortDirection, Video, VideoFilter, VideoSortField};
