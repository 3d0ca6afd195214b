mod common;
mod record;
mod routing;
