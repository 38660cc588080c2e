//! Static page generator: renders every post into its HTML page.
//! Run with: cargo run --bin generate-pages

use report_api::config::Config;
use report_api::render::Renderer;
use report_api::store::PostStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!(
        "Loading posts from {}...",
        config.storage.data_path.display()
    );
    let store = PostStore::new(&config.storage.data_path, &config.storage.default_image);
    let posts = store.list_all().await?;

    let renderer = Renderer::from_file(&config.render.template_path)?;

    println!("Generating {} pages...", posts.len());
    tokio::fs::create_dir_all(&config.render.pages_dir).await?;
    for post in &posts {
        let page = renderer.render(post)?;
        let out = config.render.pages_dir.join(&post.link);
        tokio::fs::write(&out, page).await?;
        println!("  wrote {}", out.display());
    }

    println!("Done.");
    Ok(())
}
