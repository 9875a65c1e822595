pub mod app;
mod deserializers;
mod routes;
