//! Line-based console front end: each stdin line arrives as a message.
//!
//! Usage: `augur-console [config.toml]`. Try `!help`, `!echo hi`, `!seen`
//! and `!reload demo/greeter`.

use augur::logging::init_logging;
use augur::prelude::*;
use futures::stream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

struct ConsolePlatform {
    me: User,
}

#[async_trait]
impl Platform for ConsolePlatform {
    fn current_user(&self) -> Option<User> {
        Some(self.me.clone())
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        println!("[{}] {}: {}", channel_id, self.me.name, content);
        Ok(())
    }

    async fn respond(&self, interaction: &Interaction, response: InteractionResponse) -> Result<()> {
        println!("[interaction {}] {}", interaction.id, response.content);
        Ok(())
    }

    async fn fetch_application_commands(&self, _scope: &CommandScope) -> Result<Vec<augur::core::RemoteCommand>> {
        Ok(Vec::new())
    }
}

fn core_module() -> Result<Module> {
    let help = Command::builder("help")
        .alias("commands")
        .description("List available commands")
        .process(|cx: CommandContext, _| async move {
            let Some(manager) = cx.ctx.modules() else {
                return cx.reply("No module manager attached").await;
            };
            let listing: Vec<String> = manager
                .commands()
                .list()
                .iter()
                .filter(|command| !command.hidden)
                .map(|command| format!("{} ({}): {}", command.name, command.category, command.description))
                .collect();
            cx.reply(listing.join("\n")).await
        })
        .build()?;

    let ping = Command::builder("ping")
        .description("Check that the client is responsive")
        .process(|cx: CommandContext, _| async move { cx.reply("pong").await })
        .build()?;

    let reload = Command::builder("reload")
        .syntax("<origin>")
        .description("Reload a module, keeping its carried state")
        .category("Admin")
        .process(|cx: CommandContext, input: CommandInput| async move {
            let target = input.text();
            if target.is_empty() {
                return cx.reply("Usage: reload <origin>").await;
            }
            let Some(manager) = cx.ctx.modules() else {
                return cx.reply("No module manager attached").await;
            };
            manager.reload(&Origin::new(&target)).await?;
            cx.reply(format!("Reloaded {}", target)).await
        })
        .build()?;

    Ok(Module::new().add_command(help).add_command(ping).add_command(reload))
}

fn greeter_module() -> Result<Module> {
    let seen = Arc::new(AtomicU64::new(0));

    let counter = Arc::clone(&seen);
    let report = Arc::clone(&seen);
    let restore = Arc::clone(&seen);
    let stash = Arc::clone(&seen);

    let echo = Command::builder("echo")
        .alias("say")
        .syntax("<text>")
        .description("Repeat the text back")
        .process(|cx: CommandContext, input: CommandInput| async move { cx.reply(input.text()).await })
        .build()?;

    let seen_cmd = Command::builder("seen")
        .description("Messages seen, kept across reloads")
        .process(move |cx: CommandContext, _| {
            let report = Arc::clone(&report);
            async move { cx.reply(format!("{} messages", report.load(Ordering::Relaxed))).await }
        })
        .build()?;

    Ok(Module::new()
        .add_command(echo)
        .add_command(seen_cmd)
        .add_event("messageCreate", move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(Flow::Continue)
            }
        })
        .set_init(move |_, carried| async move {
            if let Some(count) = take_carried::<u64>(carried) {
                restore.store(count, Ordering::Relaxed);
            }
            Ok(())
        })
        .set_unload(move |_| async move { Ok(carry(stash.load(Ordering::Relaxed))) }))
}

augur::module_init!("demo/core", core_module);
augur::module_init!("demo/greeter", greeter_module);

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::from_file(&path)?,
        None => ClientConfig::default(),
    };

    let me = User::new("0", "augur").as_bot();
    let client = AugurClient::builder()
        .with_config(config)
        .with_platform(Arc::new(ConsolePlatform { me: me.clone() }))
        .with_registered_modules()
        .build()
        .await?;

    tracing::info!(version = augur::VERSION, intents = %client.intents(), "console ready");
    client.handle_event(ClientEvent::Ready { user: me }).await;

    let author = User::new("1", "console");
    let lines = BufReader::new(tokio::io::stdin()).lines();
    let events = stream::unfold((lines, author), |(mut lines, author)| async move {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let message = Message::new(author.clone(), "console", line);
                Some((ClientEvent::MessageCreate(Arc::new(message)), (lines, author)))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "stdin closed");
                None
            }
        }
    });

    let handled = client.run(events).await;
    tracing::info!(handled, "console finished");
    Ok(())
}
