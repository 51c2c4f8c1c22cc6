mod common;
mod document;
mod service;
