use clap::CommandFactory;
use std::fs;
use std::path::PathBuf;

// Include cli module from main crate
#[path = "../cli.rs"]
mod cli;

fn rendered(man: clap_mangen::Man) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    Ok(buf)
}

fn main() -> std::io::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&out_dir)?;

    let root = cli::Cli::command();

    // One page for the top-level command, one per subcommand
    let mut pages = vec![("hashedit".to_string(), clap_mangen::Man::new(root.clone()))];
    for sub in root.get_subcommands() {
        if sub.get_name() == "help" {
            continue;
        }
        let title = format!("hashedit-{}", sub.get_name());
        pages.push((title.clone(), clap_mangen::Man::new(sub.clone()).title(title)));
    }

    for (name, man) in pages {
        let path = out_dir.join(format!("{}.1", name));
        fs::write(&path, rendered(man)?)?;
        println!("Generated {}", path.display());
    }

    Ok(())
}
