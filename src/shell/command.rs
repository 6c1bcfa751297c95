use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Subcommand;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use mini_vsfs::{
    disk::FileDisk,
    fs::{directory::DirEntryType, error::Result, inspect::ImageReport},
    format_image, ingest_file, FileSystem, FormatParams,
};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new image
    Format {
        /// Output image path
        #[arg(long)]
        image: PathBuf,
        /// Image size in KiB (180-4096, multiple of 4)
        #[arg(long)]
        size_kib: u32,
        /// Inode capacity (128-512)
        #[arg(long)]
        inodes: u32,
    },
    /// Copy a file into the root directory of an image, writing a new image
    Add {
        /// Existing image
        #[arg(long)]
        input: PathBuf,
        /// New image to write
        #[arg(long)]
        output: PathBuf,
        /// File to add
        #[arg(long)]
        file: PathBuf,
    },
    /// List the root directory
    Ls {
        #[arg(long)]
        image: PathBuf,
    },
    /// Show superblock and usage information
    Stat {
        #[arg(long)]
        image: PathBuf,
    },
}

pub fn execute_command(cmd: &Command) -> Result<()> {
    match cmd {
        Command::Format {
            image,
            size_kib,
            inodes,
        } => {
            let params = FormatParams::new(*size_kib, *inodes)?;
            let pb = spinner(format!("💾 Formatting {}...", image.display()));
            let result = format_image(image, &params);
            pb.finish_and_clear();

            let fs = result?;
            println!(
                "✅ MiniVSFS image created: {}",
                image.display().to_string().green()
            );
            println!(
                "{}",
                format!(
                    "   {} blocks, {} inodes, data region {} blocks",
                    fs.super_block.total_blocks,
                    fs.super_block.inode_count,
                    fs.super_block.data_region_blocks
                )
                .bright_black()
            );
        }
        Command::Add {
            input,
            output,
            file,
        } => {
            let pb = spinner(format!("✏️  Adding {}...", file.display()));
            let result = ingest_file(input, output, file);
            pb.finish_and_clear();

            let ingestion = result?;
            println!(
                "📝 File added successfully: {} → {}",
                file.display().to_string().green(),
                output.display().to_string().cyan()
            );
            println!(
                "{}",
                format!(
                    "   inode {}, {} bytes, blocks {:?}",
                    ingestion.inode_no, ingestion.size, ingestion.blocks
                )
                .bright_black()
            );
        }
        Command::Ls { image } => {
            let report = load_report(image)?;
            for entry in &report.entries {
                let icon = match entry.kind {
                    Some(DirEntryType::Directory) => "📁",
                    Some(DirEntryType::File) => "📄",
                    None => "❓",
                };
                let name = match entry.kind {
                    Some(DirEntryType::Directory) => entry.name.blue().bold(),
                    _ => entry.name.normal(),
                };
                let flag = if entry.entry_ok && entry.inode_ok {
                    "".normal()
                } else {
                    "  (checksum mismatch)".red()
                };
                println!(
                    "{}  {:<5} {:>8}  {}{}",
                    icon, entry.inode_no, entry.size, name, flag
                );
            }
        }
        Command::Stat { image } => {
            let report = load_report(image)?;
            print_stat(&report);
        }
    }

    Ok(())
}

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn load_report(image: &Path) -> Result<ImageReport> {
    let disk = FileDisk::open(image)?;
    FileSystem::load(&disk)?.report()
}

fn print_stat(report: &ImageReport) {
    let sb = &report.super_block;
    let ok = |good: bool| if good { "ok".green() } else { "BAD".red().bold() };

    println!("{}", "📊 Image Info".bright_yellow().bold());
    println!("{}: {:#010x} (v{})", "Magic".blue(), sb.magic, sb.version);
    println!("{}: {} bytes", "Block size".blue(), sb.block_size);
    println!("{}: {}", "Total blocks".blue(), sb.total_blocks);
    println!(
        "{}: {}/{}",
        "Inodes used".blue(),
        report.inodes_used,
        sb.inode_count
    );
    println!(
        "{}: {}/{}",
        "Data blocks used".blue(),
        report.data_blocks_used,
        sb.data_region_blocks
    );
    println!(
        "{}: {}",
        "Free directory slots".blue(),
        report.free_dir_slots
    );
    println!(
        "{}: inode bitmap {}, data bitmap {}, inode table {}+{}, data {}+{}",
        "Regions".blue(),
        sb.inode_bitmap_start,
        sb.data_bitmap_start,
        sb.inode_table_start,
        sb.inode_table_blocks,
        sb.data_region_start,
        sb.data_region_blocks
    );
    let created = chrono::DateTime::from_timestamp(sb.mtime_epoch as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| sb.mtime_epoch.to_string());
    println!("{}: {}", "Created".blue(), created);
    println!(
        "{}: {:#010x} {}",
        "Superblock checksum".blue(),
        sb.checksum,
        ok(report.super_block_ok)
    );
    if report.bad_inodes.is_empty() {
        println!("{}: {}", "Inode checksums".blue(), ok(true));
    } else {
        println!(
            "{}: {} {:?}",
            "Inode checksums".blue(),
            ok(false),
            report.bad_inodes
        );
    }
}
