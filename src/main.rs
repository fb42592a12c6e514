use std::process::ExitCode;

use lockstep::{Cartridge, Config, Console, Result};

fn build_demo_ines() -> Vec<u8> {
    // iNES header
    let mut header = Vec::with_capacity(16);
    header.extend_from_slice(b"NES\x1A");
    header.push(1); // 1 x 16KB PRG
    header.push(1); // 1 x 8KB CHR
    header.push(0); // flags6 (horizontal mirroring, no trainer, no battery)
    header.push(0); // flags7
    header.push(1); // PRG-RAM size in 8KB units
    header.extend_from_slice(&[0u8; 7]);

    let mut prg = vec![0u8; 16 * 1024];

    // Program at $8000: set a backdrop colour, enable NMI, then spin.
    let program: &[u8] = &[
        0xA9, 0x10, // LDA #$10
        0x69, 0x05, // ADC #$05 => A = 0x15
        0x8D, 0x00, 0x02, // STA $0200
        0xA9, 0x3F, // LDA #$3F
        0x8D, 0x06, 0x20, // STA $2006
        0xA9, 0x00, // LDA #$00
        0x8D, 0x06, 0x20, // STA $2006
        0xA9, 0x21, // LDA #$21 (light blue)
        0x8D, 0x07, 0x20, // STA $2007
        0xA9, 0x80, // LDA #$80
        0x8D, 0x00, 0x20, // STA $2000
        0xE8, // INX
        0x4C, 0x1B, 0x80, // JMP $801B (INX)
    ];
    prg[..program.len()].copy_from_slice(program);

    // NMI handler at $8100: count frames at $0201.
    prg[0x100..0x104].copy_from_slice(&[0xEE, 0x01, 0x02, 0x40]); // INC $0201; RTI

    // Vectors at the top of the 16KB bank, mirrored to $FFFA-$FFFF.
    let (nmi, reset, irq): (u16, u16, u16) = (0x8100, 0x8000, 0x8100);
    prg[0x3FFA..0x3FFC].copy_from_slice(&nmi.to_le_bytes());
    prg[0x3FFC..0x3FFE].copy_from_slice(&reset.to_le_bytes());
    prg[0x3FFE..0x4000].copy_from_slice(&irq.to_le_bytes());

    let chr = vec![0u8; 8 * 1024];

    let mut rom = header;
    rom.extend_from_slice(&prg);
    rom.extend_from_slice(&chr);
    rom
}

fn run() -> Result<()> {
    let config = Config::default();
    let mut console = match std::env::args().nth(1) {
        Some(path) => Console::new(Cartridge::from_path(&path, config.logger.clone())?, config),
        None => Console::from_ines_bytes(&build_demo_ines(), config)?,
    };

    let cycles = console.run_frame()?;
    console.run_frame()?;

    let m0200 = console.bus_mut().peek(0x0200);
    let m0201 = console.bus_mut().peek(0x0201);
    let cpu = console.cpu().state();
    println!("frames: {} ({} CPU cycles in the first)", console.frame_count(), cycles);
    println!("A: 0x{:02X}", cpu.a);
    println!("X: 0x{:02X}", cpu.x);
    println!("Y: 0x{:02X}", cpu.y);
    println!("SP: 0x{:02X}", cpu.sp);
    println!("PC: 0x{:04X}", cpu.pc);
    println!("P (flags): 0b{:08b}", cpu.status);
    println!("mem[0x0200]: 0x{:02X}", m0200);
    println!("mem[0x0201]: 0x{:02X}", m0201);
    println!("audio samples: {}", console.take_samples().len());

    #[cfg(feature = "screenshot")]
    {
        lockstep::screenshot::save_png(console.frame_buffer(), "frame.png")?;
        println!("wrote frame.png");
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
