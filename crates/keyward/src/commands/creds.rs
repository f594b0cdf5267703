//! Creds command

use anyhow::Result;
use keyward_lifecycle::ops::RoleNameRequest;
use keyward_lifecycle::Request;

use super::Context;
use crate::cli::CredsArgs;

pub async fn run(args: CredsArgs, ctx: &Context) -> Result<()> {
    let response = ctx
        .execute(Request::CredsRead(RoleNameRequest { name: args.name }))
        .await?;
    ctx.print(&response)
}
