use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    apexdeps completions bash > ~/.bash_completion.d/apexdeps\n\n\
                  Generate zsh completions:\n    apexdeps completions zsh > ~/.zfunc/_apexdeps\n\n\
                  Generate fish completions:\n    apexdeps completions fish > ~/.config/fish/completions/apexdeps.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
