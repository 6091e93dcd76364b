use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

pub fn generate_completions(shell: Shell) {
    let mut cmd = crate::Cli::command();
    generate(shell, &mut cmd, "orgstars", &mut io::stdout());

    eprintln!();
    eprintln!("Save the output to the appropriate location for your shell:");
    match shell {
        Shell::Bash => {
            eprintln!("  orgstars completions bash > ~/.local/share/bash-completion/completions/orgstars");
        }
        Shell::Zsh => {
            eprintln!("  orgstars completions zsh > ~/.zsh/completions/_orgstars");
            eprintln!("  # (Add 'fpath=(~/.zsh/completions $fpath)' before 'compinit' in .zshrc)");
        }
        Shell::Fish => {
            eprintln!("  orgstars completions fish > ~/.config/fish/completions/orgstars.fish");
        }
        _ => {}
    }
}
