#![deny(clippy::all, clippy::pedantic)]

use layoutgen_api_types::{CatalogListItem, InfographicDetail, SlideDetail};
use reqwest::Method;

use crate::args::CatalogCmd;
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle_slides(ctx: &Ctx, cmd: CatalogCmd) -> Result<(), CliError> {
    match cmd {
        CatalogCmd::List => {
            let res: Vec<CatalogListItem> =
                ctx.request(Method::GET, "api/slides", None).await?;
            print_json(&res)?;
        }
        CatalogCmd::Show { index } => {
            let res: SlideDetail = ctx
                .request(Method::GET, &format!("api/slides/{}", encode(&index)), None)
                .await?;
            print_json(&res)?;
        }
    }
    Ok(())
}

pub async fn handle_infographics(ctx: &Ctx, cmd: CatalogCmd) -> Result<(), CliError> {
    match cmd {
        CatalogCmd::List => {
            let res: Vec<CatalogListItem> =
                ctx.request(Method::GET, "api/infographics", None).await?;
            print_json(&res)?;
        }
        CatalogCmd::Show { index } => {
            let res: InfographicDetail = ctx
                .request(
                    Method::GET,
                    &format!("api/infographics/{}", encode(&index)),
                    None,
                )
                .await?;
            print_json(&res)?;
        }
    }
    Ok(())
}

fn encode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
