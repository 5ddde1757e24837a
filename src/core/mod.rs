// ─── mrpack-realizer core ───
//
// Architecture:
//   core/
//     integrity/  : Multi-digest hashing + file verification
//     downloader/ : Fetcher trait + streaming HTTP fetcher
//     modpack/    : Manifest model, concurrent installer, install report
//     archive     : Zip extraction with path containment
//     overrides   : Overlay of bundled override files
//     settings    : Tunables for a run

pub mod archive;
pub mod downloader;
pub mod error;
pub mod http;
pub mod integrity;
pub mod modpack;
pub mod overrides;
pub mod settings;
