use crate::args::Command;
use crate::prompt::Prompt;
use anyhow::{Context, Result, bail};
use ksafe::VaultManager;
use ksafe::domain::{AuthTokens, RecordContent, VaultRecord};
use tracing::debug;

pub(crate) async fn run(manager: &VaultManager, prompt: Prompt, command: Command) -> Result<()> {
    match command {
        Command::Login { user_id, id_token, refresh_token } => {
            let tokens = AuthTokens::new(user_id, id_token, refresh_token);
            let user_id = tokens.user_id.clone();
            unlock(manager, prompt, tokens).await?;
            println!("Signed in as {user_id}");
        },
        Command::Logout => {
            manager.logout().await?;
            println!("Signed out");
        },
        command => {
            let tokens = manager
                .restore_session()
                .await?
                .context("Not signed in. Run `ksafe login <user-id>` first")?;
            unlock(manager, prompt, tokens).await?;
            let outcome = run_unlocked(manager, prompt, command).await;
            manager.lock().await?;
            outcome?;
        },
    }
    Ok(())
}

async fn unlock(manager: &VaultManager, prompt: Prompt, tokens: AuthTokens) -> Result<()> {
    let master = prompt.secret("Master password")?;
    manager.unlock(tokens, &master).await?;
    debug!("Vault unlocked");
    Ok(())
}

async fn run_unlocked(manager: &VaultManager, prompt: Prompt, command: Command) -> Result<()> {
    match command {
        Command::Add { description, username, url } => {
            let password = prompt.secret(&format!("Password for {description}"))?;
            let id = manager.save(RecordContent::new(description, username, url, password)).await?;
            let records = manager.get_all().await?;
            match records.iter().find(|r| r.local_id == id) {
                Some(record) => println!("Added #{id} [{}]", record.flags),
                None => println!("Added #{id}"),
            }
        },
        Command::List => print_records(&manager.get_all().await?),
        Command::Remove { id } => {
            if !manager.delete(id).await? {
                bail!("No record #{id}");
            }
            println!("Removed #{id}");
        },
        Command::Audit => {
            manager.refresh_security().await?;
            let records = manager.get_all().await?;
            let flagged: Vec<_> = records.into_iter().filter(|r| !r.flags.is_empty()).collect();
            print_records(&flagged);
            println!("{} record(s) need attention", flagged.len());
        },
        Command::Duplicates => print_records(&manager.find_duplicates().await?),
        Command::Dedupe => {
            let removed = manager.clean_duplicates().await?;
            println!("Removed {removed} duplicate(s)");
        },
        Command::Login { .. } | Command::Logout => unreachable!("handled before unlock"),
    }
    Ok(())
}

fn print_records(records: &[VaultRecord]) {
    if records.is_empty() {
        println!("No records");
        return;
    }
    for record in records {
        let content = &record.content;
        let sync = if record.synced { "" } else { " *" };
        println!(
            "#{:<4} {:<24} {:<24} {:<32} [{}]{sync}",
            record.local_id.to_string(),
            content.description, content.username, content.url, record.flags
        );
    }
}
