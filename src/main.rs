// GUI-subsystem binary: no console window is ever allocated by Windows.
// In CLI mode (--input/-i present) it attaches to the launching terminal.
#![windows_subsystem = "windows"]

use eframe::egui;
use ninepatchfe::app::NinePatchApp;
use ninepatchfe::cli;
use ninepatchfe::logger;
use ninepatchfe::settings::EditorSettings;

/// Attach to the launching terminal so CLI output is visible from a
/// GUI-subsystem binary.
#[cfg(target_os = "windows")]
fn attach_parent_console() {
    unsafe extern "system" {
        fn AttachConsole(process_id: u32) -> i32;
        fn SetStdHandle(std_handle: u32, handle: isize) -> i32;
        fn CreateFileW(
            name: *const u16,
            access: u32,
            share: u32,
            security: *const std::ffi::c_void,
            disposition: u32,
            flags: u32,
            template: isize,
        ) -> isize;
    }
    const ATTACH_PARENT_PROCESS: u32 = 0xFFFF_FFFF;
    const GENERIC_WRITE: u32 = 0x4000_0000;
    const SHARE_READ_WRITE: u32 = 0x3;
    const OPEN_EXISTING: u32 = 3;
    const STD_OUTPUT_HANDLE: u32 = -11i32 as u32;
    const STD_ERROR_HANDLE: u32 = -12i32 as u32;

    let conout: Vec<u16> = "CONOUT$\0".encode_utf16().collect();
    unsafe {
        if AttachConsole(ATTACH_PARENT_PROCESS) == 0 {
            return;
        }
        let out = CreateFileW(conout.as_ptr(), GENERIC_WRITE, SHARE_READ_WRITE, std::ptr::null(), OPEN_EXISTING, 0, 0);
        if out != -1 {
            SetStdHandle(STD_OUTPUT_HANDLE, out);
            SetStdHandle(STD_ERROR_HANDLE, out);
        }
    }
}

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        #[cfg(target_os = "windows")]
        attach_parent_console();

        use clap::Parser;
        let args = cli::CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();
    ninepatchfe::log_info!("Starting GUI");

    // Size the window around the editor and the side panel
    let settings = EditorSettings::load();
    let width = settings.viewport_size + settings.preview_size + 80.0;
    let height = settings.viewport_size.max(settings.preview_size + 360.0) + 90.0;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([480.0, 360.0])
            .with_title("NinePatchFE"),
        ..Default::default()
    };

    eframe::run_native(
        "NinePatchFE",
        options,
        Box::new(|cc| Box::new(NinePatchApp::new(cc))),
    )
}
