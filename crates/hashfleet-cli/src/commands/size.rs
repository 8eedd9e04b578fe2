use std::path::Path;

use super::{Context, Input, live_handler, print_response, read_event};

pub async fn run(ctx: &Context, event: Option<&Path>, dry_run: bool) -> anyhow::Result<()> {
    let response = match read_event(event)? {
        Input::Event(event) => live_handler(ctx, dry_run).await.handle_capacity(&event).await,
        Input::Rejected(response) => response,
    };
    print_response(&response)
}
