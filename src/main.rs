//! OZD probe CLI - pokes at the native OZD to DDS conversion library.
//!
//! This is the main entry point for the `ozd` command-line application.
//! Console output is in Portuguese, matching the rest of the asset tooling.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ozd::prelude::*;
use ozd::probe::Error as ProbeError;

/// OZD probe - guesses its way through the undocumented OZD conversion library
#[derive(Parser)]
#[command(name = "ozd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the native library (defaults to ozd.dll next to the executable)
    #[arg(short, long, global = true, env = "OZD_LIBRARY")]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an OZD file to DDS by trying the guessed entry points
    Convert {
        /// Input OZD file
        input: PathBuf,

        /// Output DDS file
        output: PathBuf,
    },

    /// Check which common conversion function names the library exports
    Discover {
        /// Extra names to check after the built-in candidates
        extra: Vec<String>,
    },

    /// List every export of a DLL by reading its PE export table
    Exports {
        /// DLL to read (defaults to the native library)
        dll: Option<PathBuf>,
    },

    /// Show the header of a DDS file
    Inspect {
        /// DDS file
        input: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    let library = match cli.library {
        Some(path) => path,
        None => default_library_path().context("Failed to locate the native library")?,
    };
    log::debug!("native library: {}", library.display());

    match cli.command {
        Commands::Convert { input, output } => Ok(cmd_convert(&library, &input, &output)),
        Commands::Discover { extra } => {
            cmd_discover(&library, &extra)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Exports { dll } => {
            cmd_exports(dll.as_deref().unwrap_or(library.as_path()))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inspect { input } => {
            cmd_inspect(&input)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_convert(library: &Path, input: &Path, output: &Path) -> ExitCode {
    println!("Convertendo: {} -> {}", input.display(), output.display());

    let result = ConversionProbe::new(library).run(input, output);
    print_conversion(&result, library, output);
    exit_code(&result)
}

/// 0 when some shape appeared to work, 1 for everything else.
fn exit_code(result: &Result<ConversionReport, ProbeError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn print_conversion(result: &Result<ConversionReport, ProbeError>, library: &Path, output: &Path) {
    match result {
        Ok(report) => {
            print_attempts(report);
            println!("SUCESSO! Arquivo convertido: {}", output.display());

            if report.output_preexisted {
                println!(
                    "AVISO: {} ja existia antes da conversao; o resultado pode ser antigo",
                    output.display()
                );
            }
            print_dds_check(output);
        }
        Err(ProbeError::LibraryNotFound(path)) => {
            println!("ERRO: DLL nao encontrada em {}", path.display());
        }
        Err(ProbeError::InputNotFound(path)) => {
            println!("ERRO: Arquivo OZD nao encontrado: {}", path.display());
        }
        Err(e @ ProbeError::Load { .. }) => {
            println!("ERRO ao carregar DLL: {}", e);
            print_architecture_hint(library);
        }
        Err(ProbeError::AllAttemptsFailed(report)) => {
            print_attempts(report);
            println!("ERRO: Nenhuma assinatura de funcao funcionou");
        }
        Err(e) => println!("ERRO: {}", e),
    }
}

fn print_attempts(report: &ConversionReport) {
    for attempt in &report.attempts {
        match &attempt.outcome {
            AttemptOutcome::Succeeded { status } => {
                println!("{}: retornou {}", attempt.shape, status);
            }
            AttemptOutcome::NoEffect { status } => {
                println!(
                    "{}: retornou {}, nenhum arquivo gerado",
                    attempt.shape, status
                );
            }
            AttemptOutcome::Failed(reason) => {
                println!("{} falhou: {}", attempt.shape, reason);
            }
        }
    }
}

/// Success only means a file appeared; say whether it looks like a DDS.
fn print_dds_check(output: &Path) {
    match inspect_file(output) {
        Ok(summary) => {
            println!(
                "DDS: {} x {}, {}, {} mipmaps",
                summary.width,
                summary.height,
                summary.format_label(),
                summary.mipmap_count
            );
            if summary.is_payload_complete() == Some(false) {
                println!("AVISO: dados menores do que o header indica");
            }
        }
        Err(e) => println!("AVISO: a saida nao parece ser um DDS valido: {}", e),
    }
}

fn print_architecture_hint(library: &Path) {
    match ExportTable::open(library) {
        Ok(table) if !table.machine.matches_host() => {
            println!(
                "A DLL foi compilada para {}; este processo nao pode carrega-la",
                table.machine
            );
        }
        Ok(_) => println!("A DLL pode requerer dependencias que nao foram encontradas"),
        Err(_) => println!("O arquivo nao parece ser uma DLL valida"),
    }
}

fn cmd_discover(library: &Path, extra: &[String]) -> Result<()> {
    println!("DLL Path: {}", library.display());
    println!("DLL existe? {}", if library.exists() { "sim" } else { "nao" });

    let probe = DiscoveryProbe::new(library).with_candidates(candidate_list(extra));
    let report = match probe.run() {
        Ok(report) => report,
        Err(e @ ProbeError::Load { .. }) => {
            print_architecture_hint(library);
            return Err(e).context("Failed to load the native library");
        }
        Err(e) => return Err(e).context("Discovery failed"),
    };

    println!("DLL carregada com sucesso!");
    println!("\nProcurando funcoes exportadas...");

    if report.found.is_empty() {
        println!("  Nenhuma funcao comum encontrada");
    }
    for name in &report.found {
        println!("  Encontrada: {}", name);
    }

    println!(
        "\n{} de {} candidatos encontrados",
        report.found.len(),
        report.candidates.len()
    );

    Ok(())
}

fn cmd_exports(dll: &Path) -> Result<()> {
    let table = ExportTable::open(dll).context("Failed to read PE export table")?;

    println!("DLL: {}", dll.display());
    if let Some(name) = &table.dll_name {
        println!("Nome interno: {}", name);
    }
    println!("Arquitetura: {}", table.machine);
    if !table.machine.matches_host() {
        println!("AVISO: este processo nao consegue carregar uma DLL {}", table.machine);
    }

    println!("\nFUNCOES EXPORTADAS ({} funcoes):", table.len());
    for (i, export) in table.entries.iter().enumerate() {
        match &export.forwarder {
            Some(target) => println!(
                "{:3}. {} (ordinal: {}, encaminhada para {})",
                i + 1,
                export.name,
                export.ordinal,
                target
            ),
            None => println!(
                "{:3}. {} (ordinal: {}, RVA: {:#010X})",
                i + 1,
                export.name,
                export.ordinal,
                export.rva
            ),
        }
    }

    let unnamed = (table.function_count as usize).saturating_sub(table.len());
    if unnamed > 0 {
        println!("\n{} exportacoes somente por ordinal", unnamed);
    }

    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<()> {
    let summary = inspect_file(input).context("Failed to read DDS header")?;

    println!("Tamanho do arquivo: {} bytes", summary.file_size);
    println!("\nHEADER DDS:");
    println!("  Header size: {}", summary.header_size);
    println!("  Flags: {:#x}", summary.flags);
    println!("  Dimensoes: {} x {}", summary.width, summary.height);
    println!("  Pitch/Linear size: {}", summary.pitch_or_linear_size);
    println!("  MipMap count: {}", summary.mipmap_count);

    println!("\nPIXEL FORMAT:");
    println!("  Flags: {:#x}", summary.pixel_flags);
    println!("  FourCC: \"{}\"", summary.four_cc);
    println!("  RGB Bit Count: {}", summary.rgb_bit_count);
    if let Some(dxgi) = summary.dxgi_format {
        println!("  DXGI format: {}", dxgi);
    }

    println!("\nFormato: {}", summary.format_label());
    match summary.expected_payload_size() {
        Some(expected) => println!(
            "Dados: {} bytes (esperado {})",
            summary.payload_size, expected
        ),
        None => println!("Dados: {} bytes", summary.payload_size),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn dds_header(width: u32, height: u32, mips: u32) -> Vec<u8> {
        let mut data = b"DDS ".to_vec();
        data.resize(4 + 124, 0);
        data[4..8].copy_from_slice(&124u32.to_le_bytes());
        data[12..16].copy_from_slice(&height.to_le_bytes());
        data[16..20].copy_from_slice(&width.to_le_bytes());
        data[28..32].copy_from_slice(&mips.to_le_bytes());
        data[76..80].copy_from_slice(&32u32.to_le_bytes());
        data[80..84].copy_from_slice(&4u32.to_le_bytes());
        data[84..88].copy_from_slice(b"DXT5");
        data
    }

    #[test]
    fn test_exit_code_success() {
        let result = Ok(ConversionReport::default());
        assert_eq!(exit_code(&result), ExitCode::SUCCESS);
    }

    #[test]
    fn test_exit_code_failures() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ozd.dll");

        let load = NativeLibrary::open(&missing).map(|_| ConversionReport::default());
        assert!(matches!(load, Err(ProbeError::Load { .. })));
        assert_eq!(exit_code(&load), ExitCode::FAILURE);

        let failures = [
            ProbeError::LibraryNotFound(missing.clone()),
            ProbeError::InputNotFound(dir.path().join("bg_3_1.ozd")),
            ProbeError::AllAttemptsFailed(ConversionReport::default()),
            ProbeError::EmptyInput,
        ];
        for error in failures {
            assert_eq!(exit_code(&Err(error)), ExitCode::FAILURE);
        }
    }

    #[test]
    fn test_missing_library_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bg_3_1.ozd");
        fs::write(&input, b"OZD").unwrap();

        let code = cmd_convert(
            &dir.path().join("ozd.dll"),
            &input,
            &dir.path().join("bg_3_1.dds"),
        );
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn test_load_failure_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("ozd.dll");
        let input = dir.path().join("bg_3_1.ozd");
        fs::write(&library, b"MZ not really a dll").unwrap();
        fs::write(&input, b"OZD").unwrap();

        let code = cmd_convert(&library, &input, &dir.path().join("bg_3_1.dds"));
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn test_dds_check_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg_3_1.dds");

        print_dds_check(&path);

        fs::write(&path, b"\xff\x00garbage").unwrap();
        print_dds_check(&path);

        fs::write(&path, dds_header(u32::MAX, u32::MAX, 1)).unwrap();
        print_dds_check(&path);

        fs::write(&path, dds_header(4, 4, u32::MAX)).unwrap();
        print_dds_check(&path);
    }

    #[test]
    fn test_architecture_hint_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ozd.dll");

        print_architecture_hint(&path);

        fs::write(&path, b"MZ\x00\x01").unwrap();
        print_architecture_hint(&path);
    }
}
