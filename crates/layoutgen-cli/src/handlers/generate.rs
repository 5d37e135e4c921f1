#![deny(clippy::all, clippy::pedantic)]

use layoutgen_api_types::GenerateResponse;
use reqwest::Method;

use crate::args::GenerateArgs;
use crate::client::{CliError, Ctx};
use crate::io::{file_name_of, read_request, write_file};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, args: GenerateArgs) -> Result<(), CliError> {
    let body = read_request(&args.file).await?;
    let res: GenerateResponse = ctx
        .request(Method::POST, "api/generate", Some(&body))
        .await?;

    if let Some(dir) = args.download.as_deref() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| CliError::OutputFile {
                path: dir.display().to_string(),
                source,
            })?;
        for url in [&res.image_url, &res.bbox_url] {
            let bytes = ctx.download(url).await?;
            write_file(&dir.join(file_name_of(url)?), &bytes).await?;
        }
    }

    print_json(&res)
}
