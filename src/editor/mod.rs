mod history;
mod liveness;
mod session;
mod upload;

pub use history::EditHistory;
pub use liveness::Liveness;
pub use session::{BackgroundSave, EditorSession};
pub use upload::{AssetUploader, UploadFile};
