use anyhow::{Context, Result};
use offer_grader::utils::logging;
use offer_grader::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config).context("初始化失败")?;
    app.run().await.context("运行失败")?;

    Ok(())
}
