mod album_data_service;

pub use album_data_service::{AlbumDataService, AlbumDocument, AlbumSummary};
