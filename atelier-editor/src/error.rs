/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use atelier_core::SceneError;
use atelier_render::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Design not found: {0}")]
    NotFound(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("Local storage write failed: {0}")]
    WriteFailed(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File is too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("File is empty")]
    Empty,

    #[error("Upload failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Design name must not be empty")]
    EmptyName,

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Listener for {0:?} is already registered")]
    DuplicateListener(crate::controller::WindowEvent),
}
