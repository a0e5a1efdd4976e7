/*
 * This module provides data aquisition abilites for the application.
 * The topology layer only sees `SnapshotSource` and `CommandEmitter`; how the data
 * is fetched lives here.
 */

pub mod http;

pub use http::LabApiClient;
