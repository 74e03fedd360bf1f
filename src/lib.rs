// Library root
// -----------
// The binary (`main.rs`) is a thin wrapper over these modules.
//
// Module responsibilities:
// - `api`: the two HTTP calls against the drive (create the file record,
//   PUT the contents) and the response types.
// - `cli`: flag parsing and the upload flow that ties the calls together.
// - `config`: drive endpoints, access key and timeout.
// - `error`: the error type returned by `api`.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
