use clap::Parser;
use goblin::elf::program_header::PT_LOAD;
use hart_core::board::{Board, Config};
use hart_core::registers::Specifier;
use hart_core::simulator::SimulationAllocator;
use log::info;
use std::fs::File;
use std::io::Read;

type Simulator = hart_core::simulator::Simulator<Board<SimulationAllocator>>;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// ELF binary to load and run.
    elf: String,

    /// Give up and stop after this many retired instructions if the guest never signals
    /// completion through `tohost`. Unbounded by default.
    #[arg(long)]
    max_steps: Option<usize>,

    /// Name of the ELF symbol whose word address is polled as the riscv-tests/riscv-arch-test
    /// `tohost` handshake word. If the binary defines no such symbol, the run never stops on its
    /// own and only `--max-steps` (or Ctrl-C) ends it.
    #[arg(long, default_value = "tohost")]
    tohost_symbol: String,
}

fn main() -> std::io::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut buf = Vec::new();
    let mut file = File::open(&args.elf)?;
    file.read_to_end(&mut buf)?;

    let elf_header = goblin::elf::Elf::parse(&buf).expect("failed to parse elf file");

    let tohost_address = elf_header.syms.iter().find_map(|sym| {
        let name = elf_header.strtab.get_at(sym.st_name)?;
        (name == args.tohost_symbol).then_some(sym.st_value as u32)
    });
    if let Some(address) = tohost_address {
        info!("found `{}` at {address:#010x}", args.tohost_symbol);
    }

    let segments = elf_header
        .program_headers
        .iter()
        .filter(|h| h.p_type == PT_LOAD);

    let mut simulator = Simulator::new(|allocator| {
        let board = Board::new(
            allocator,
            Config {
                tohost_address,
                ..Config::default()
            },
        );
        for h in segments {
            board.load_physical(allocator, h.p_paddr as u32, &buf[h.file_range()]);
        }
        board
    });

    let mut steps = 0usize;
    loop {
        let (allocator, board) = simulator.inspect();
        if board.is_powered_down(allocator) {
            info!("guest signalled completion through `{}`", args.tohost_symbol);
            break;
        }
        if args.max_steps.is_some_and(|max_steps| steps >= max_steps) {
            info!("stopping after reaching --max-steps={steps} without a tohost signal");
            break;
        }
        simulator.step();
        steps += 1;
    }

    let (allocator, board) = simulator.inspect();
    let registers = board.core().registers(allocator);
    info!("halted after {steps} steps at pc={:#010x}", registers.pc());
    for specifier in Specifier::iter_all() {
        info!("{specifier} = {:#018x}", registers.x(specifier));
    }

    Ok(())
}
