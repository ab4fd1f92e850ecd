mod common;
mod queue;
