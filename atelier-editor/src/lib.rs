/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

pub mod auth;
pub mod controller;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod profile;
pub mod session;
pub mod upload;

pub use auth::{AuthProvider, ExportGate, StaticAuth};
pub use controller::{Handle, InteractionController, InteractionState, ListenerRegistry, WindowEvent};
pub use error::{SessionError, StoreError, UploadError};
pub use notify::{Notice, NoticeLevel};
pub use persistence::{
    DesignStore, FallbackStore, KeyValueStore, LocalCache, MemoryKeyValueStore, StoreLocation, Stored,
};
pub use profile::{PageKind, PageProfile, ResizeBounds, Template};
pub use session::{Collaborators, EditorSession, ExportRequest};
pub use upload::UploadService;
