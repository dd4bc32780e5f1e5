// restbase-server/src/lib.rs
// HTTP transport for restbase. The binary in main.rs is a thin clap
// wrapper around `routes::build_router`.

pub mod routes;
