use std::path::Path;

use super::{Context, Input, live_handler, print_response, read_event};

pub async fn run(ctx: &Context, event: Option<&Path>) -> anyhow::Result<()> {
    let response = match read_event(event)? {
        Input::Event(event) => {
            live_handler(ctx, false)
                .await
                .handle_instance_filter(&event)
                .await
        }
        Input::Rejected(response) => response,
    };
    print_response(&response)
}
