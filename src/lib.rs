use tauri::webview::WebviewWindowBuilder;
use tauri::{Manager, RunEvent};

mod autosave;
mod event_sink;
mod events;
mod memos;
mod menu;
mod settings;
mod shared;
mod state;
mod storage;
mod types;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let builder = tauri::Builder::default()
        .enable_macos_default_menu(false)
        .menu(menu::build_menu)
        .on_menu_event(menu::handle_menu_event)
        .setup(|app| {
            let state = state::AppState::load(app.handle());
            app.manage(state);

            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let state = handle.state::<state::AppState>();
                if let Err(err) = state.store.refresh().await {
                    log::error!("Initial memo load failed: {err}");
                }
            });

            WebviewWindowBuilder::new(app, "main", tauri::WebviewUrl::App("index.html".into()))
                .title("Memo")
                .inner_size(1000.0, 680.0)
                .min_inner_size(480.0, 360.0)
                .build()?;
            Ok(())
        });

    #[cfg(desktop)]
    let builder = builder.plugin(tauri_plugin_window_state::Builder::default().build());

    let app = builder
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            // Config
            settings::get_config,
            settings::save_config,
            settings::update_config,
            // Memos
            memos::list_memos,
            memos::read_memo,
            memos::save_memo,
            memos::delete_memo,
            memos::create_memo,
            memos::toggle_pin,
            memos::update_memo_order,
            memos::reorder_memo,
            memos::import_memo_from_dialog,
            memos::import_memo_from_content,
            memos::import_memos_from_drop,
            // Editing session
            memos::select_memo,
            memos::get_selected_memo,
            memos::set_editing_title,
            memos::set_editing_content,
            memos::save_current_memo,
            memos::get_autosave_phase,
        ])
        .build(tauri::generate_context!())
        .expect("error while running tauri application");

    app.run(|app_handle, event| {
        // Write out edits still waiting on the debounce before the process goes away.
        if let RunEvent::ExitRequested { .. } = &event {
            let state = app_handle.state::<state::AppState>();
            let autosave = state.autosave.clone();
            tauri::async_runtime::block_on(async move {
                autosave.flush().await;
                autosave.teardown().await;
            });
        }
    });
}
