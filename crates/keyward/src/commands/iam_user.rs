//! IAM user command

use anyhow::Result;
use keyward_lifecycle::ops::IamUserOnboardRequest;
use keyward_lifecycle::{Request, Response};

use super::Context;
use crate::cli::IamUserCommands;
use crate::output;

pub async fn run(cmd: IamUserCommands, ctx: &Context) -> Result<()> {
    match cmd {
        IamUserCommands::Onboard(args) => {
            let request = Request::IamUserOnboard(IamUserOnboardRequest {
                namespace: args.namespace,
                username: args.username,
            });
            let response = ctx.execute(request).await?;
            if let (Response::Role(view), false) = (&response, ctx.json) {
                output::success(&format!("IAM user {} onboarded", view.username));
            }
            ctx.print(&response)
        }
    }
}
