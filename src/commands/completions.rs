//! Shell completions command

use clap::CommandFactory;

use crate::cli::CompletionsArgs;
use crate::error::{Result, config_invalid};

/// Generate shell completions
pub fn run(args: CompletionsArgs) -> Result<()> {
    let shell_name = args.shell.to_lowercase();
    let shell = match shell_name.as_str() {
        "bash" => clap_complete::Shell::Bash,
        "elvish" => clap_complete::Shell::Elvish,
        "fish" => clap_complete::Shell::Fish,
        "powershell" | "pwsh" => clap_complete::Shell::PowerShell,
        "zsh" => clap_complete::Shell::Zsh,
        _ => {
            return Err(config_invalid(format!(
                "unknown shell {:?}; supported shells: bash, elvish, fish, powershell, zsh",
                args.shell
            )));
        }
    };

    let mut cmd = <crate::cli::Cli as CommandFactory>::command();
    clap_complete::generate(shell, &mut cmd, "apexdeps", &mut std::io::stdout().lock());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(name: &str) -> CompletionsArgs {
        CompletionsArgs {
            shell: name.to_string(),
        }
    }

    #[test]
    fn test_completions_known_shells() {
        for name in ["bash", "elvish", "fish", "powershell", "pwsh", "zsh"] {
            assert!(run(shell(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_completions_mixed_case() {
        assert!(run(shell("Zsh")).is_ok());
    }

    #[test]
    fn test_completions_unknown_shell() {
        assert!(run(shell("tcsh")).is_err());
    }
}
