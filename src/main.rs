mod api;
mod charts;
mod config;
mod format;
mod network;
mod status;
mod status_pane;
mod ui;

use std::sync::{mpsc, Arc, Mutex};

use clap::Parser;
use eframe::egui;
use log::{error, info};

use api::{
    ApiClient, ApiError, DataSummary, IndexTarget, LoadDataResponse, MessageResponse,
    PerformanceResponse, QueryRequest, QueryResponse, SetupResponse, VerifyDataResponse,
};
use charts::{ChartData, ChartKind, ChartOptions, ChartSeries, ChartSpec};
use config::AppConfig;
use network::FeedSupervisor;
use status::{SharedSystemStatus, SystemStatus};
use status_pane::StatusPane;
use ui::{AlertKind, AlertStack, LoadingModal};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Desktop dashboard for the Telco NoSQL Platform
#[derive(Parser, Debug)]
#[command(name = "telcodash-desktop", version, about)]
struct Args {
    /// Realtime feed address override (host:port)
    #[arg(long)]
    feed: Option<String>,

    /// Backend API base URL override
    #[arg(long)]
    api_url: Option<String>,
}

/// Events forwarded to the UI from outside the update loop.
enum UiEvent {
    /// A panic was caught by the global hook.
    UnexpectedError,
}

/// Completed background API calls.
enum WorkerResult {
    Setup(Result<SetupResponse, ApiError>),
    LoadData(Result<LoadDataResponse, ApiError>),
    Verify(Result<VerifyDataResponse, ApiError>),
    Query {
        label: String,
        result: Result<QueryResponse, ApiError>,
    },
    Performance(Result<PerformanceResponse, ApiError>),
    Indexes {
        action: &'static str,
        result: Result<MessageResponse, ApiError>,
    },
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        error!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });
    if let Some(feed) = args.feed {
        config.feed_address = feed;
    }
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }

    let (ui_event_tx, ui_event_rx) = mpsc::channel();

    // Global catch-all: log the panic and surface a generic danger alert.
    let original_hook = std::panic::take_hook();
    let panic_tx = Mutex::new(ui_event_tx);
    std::panic::set_hook(Box::new(move |panic_info| {
        error!("Unhandled error: {}", panic_info);
        if let Ok(tx) = panic_tx.lock() {
            let _ = tx.send(UiEvent::UnexpectedError);
        }
        original_hook(panic_info);
    }));

    info!("Starting TelcoDash Desktop...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("TelcoDash Desktop"),
        ..Default::default()
    };

    eframe::run_native(
        "TelcoDash Desktop",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config, ui_event_rx)))),
    )
}

/// Which query form is active in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    CallAnalytics,
    CustomerInsights,
    CombinedBehavior,
}

impl QueryKind {
    fn label(self) -> &'static str {
        match self {
            Self::CallAnalytics => "Call analytics",
            Self::CustomerInsights => "Customer insights",
            Self::CombinedBehavior => "Combined behavior",
        }
    }
}

struct DashboardApp {
    config: AppConfig,
    status: SharedSystemStatus,
    supervisor: FeedSupervisor,
    api: ApiClient,

    status_pane: StatusPane,
    alerts: AlertStack,
    loading: LoadingModal,

    ui_event_rx: mpsc::Receiver<UiEvent>,
    worker_tx: mpsc::Sender<WorkerResult>,
    worker_rx: mpsc::Receiver<WorkerResult>,
    busy: bool,

    // Query form state
    query_kind: QueryKind,
    range_days: i64,
    call_type: String,
    segment: String,
    plan_type: String,
    month: String,
    query_limit: u32,
    index_target: IndexTarget,
    data_directory: String,

    // Results
    query_timings: Vec<(String, f64)>,
    performance_chart: Option<ChartSpec>,
    data_summary: Option<DataSummary>,
    last_result: Option<(String, serde_json::Value)>,
}

impl DashboardApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        ui_event_rx: mpsc::Receiver<UiEvent>,
    ) -> Self {
        let status: SharedSystemStatus = Arc::new(Mutex::new(SystemStatus::new()));

        // One feed connection for the life of the process.
        let supervisor = FeedSupervisor::spawn(
            config.feed_address.clone(),
            status.clone(),
            cc.egui_ctx.clone(),
        );

        let api = ApiClient::new(&config.api_base_url);
        let (worker_tx, worker_rx) = mpsc::channel();

        let mut status_pane = StatusPane::new();
        status_pane.visible = config.status_pane_visible;

        Self {
            data_directory: config.data_directory.clone(),
            range_days: config.default_range_days,
            query_limit: config.default_query_limit,
            config,
            status,
            supervisor,
            api,
            status_pane,
            alerts: AlertStack::new(),
            loading: LoadingModal::new(),
            ui_event_rx,
            worker_tx,
            worker_rx,
            busy: false,
            query_kind: QueryKind::CallAnalytics,
            call_type: String::new(),
            segment: String::new(),
            plan_type: String::new(),
            month: "2024-01".to_string(),
            index_target: IndexTarget::Both,
            query_timings: Vec::new(),
            performance_chart: None,
            data_summary: None,
            last_result: None,
        }
    }

    /// Run an API call on a worker thread behind the loading modal.
    fn spawn_api<F>(&mut self, ctx: &egui::Context, loading_message: &str, job: F)
    where
        F: FnOnce(&ApiClient) -> WorkerResult + Send + 'static,
    {
        self.loading.show(loading_message);
        self.busy = true;

        let api = self.api.clone();
        let tx = self.worker_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = job(&api);
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    fn alert_api_error(&mut self, action: &str, error: &ApiError) {
        error!("{} failed: {}", action, error);
        self.alerts
            .push(AlertKind::Danger, format!("{} failed: {}", action, error));
    }

    fn handle_worker_result(&mut self, result: WorkerResult) {
        self.busy = false;
        self.loading.hide();

        match result {
            WorkerResult::Setup(Ok(response)) => {
                let kind = if response.status.is_success() {
                    AlertKind::Success
                } else {
                    AlertKind::Danger
                };
                self.alerts.push(kind, response.message);
                if let Some(details) = response.details {
                    self.alerts.push(
                        AlertKind::Info,
                        format!(
                            "Keyspace {}, database {}",
                            details.cassandra_keyspace, details.mongodb_database
                        ),
                    );
                }
            }
            WorkerResult::Setup(Err(e)) => self.alert_api_error("Database setup", &e),

            WorkerResult::LoadData(Ok(response)) => {
                let kind = if response.status.is_success() {
                    AlertKind::Success
                } else {
                    AlertKind::Danger
                };
                self.alerts.push(kind, response.message);
                self.last_result = Some((
                    "Data load results".to_string(),
                    serde_json::json!({
                        "cassandra": response.cassandra_results,
                        "mongodb": response.mongodb_results,
                        "total_records": response.total_records,
                    }),
                ));
            }
            WorkerResult::LoadData(Err(e)) => self.alert_api_error("Data loading", &e),

            WorkerResult::Verify(Ok(response)) => {
                if response.status.is_success() {
                    self.alerts
                        .push(AlertKind::Success, "Data directory verified");
                } else {
                    self.alerts.push(AlertKind::Warning, response.message);
                }
                self.data_summary = Some(response.summary);
            }
            WorkerResult::Verify(Err(e)) => self.alert_api_error("Directory verification", &e),

            WorkerResult::Query { label, result } => match result {
                Ok(response) => {
                    if response.status.is_success() {
                        self.alerts.push(
                            AlertKind::Success,
                            format!(
                                "{} completed in {}",
                                label,
                                format::format_duration(response.execution_time * 1000.0)
                            ),
                        );
                        self.query_timings.push((label, response.execution_time));
                        self.last_result = Some(("Query result".to_string(), response.result));
                    } else {
                        self.alerts.push(AlertKind::Danger, response.message);
                    }
                }
                Err(e) => self.alert_api_error("Query execution", &e),
            },

            WorkerResult::Performance(Ok(response)) => match response.results {
                Some(results) if response.status.is_success() => {
                    self.alerts.push(
                        AlertKind::Success,
                        format!(
                            "Performance comparison completed: {:.1}% average improvement",
                            results.summary.average_improvement
                        ),
                    );
                    self.performance_chart = Some(build_performance_chart(&results));
                    self.last_result = Some((
                        "Recommendations".to_string(),
                        serde_json::json!(results.recommendations),
                    ));
                }
                _ => {
                    self.alerts.push(AlertKind::Danger, response.message);
                }
            },
            WorkerResult::Performance(Err(e)) => self.alert_api_error("Performance test", &e),

            WorkerResult::Indexes { action, result } => match result {
                Ok(response) => {
                    let kind = if response.status.is_success() {
                        AlertKind::Success
                    } else {
                        AlertKind::Danger
                    };
                    self.alerts.push(kind, response.message);
                }
                Err(e) => self.alert_api_error(action, &e),
            },
        }
    }

    fn build_query_request(&self) -> QueryRequest {
        match self.query_kind {
            QueryKind::CallAnalytics => {
                let range = format::date_range(self.range_days);
                QueryRequest::CallAnalytics {
                    start_date: range.start,
                    end_date: range.end,
                    call_type: non_empty(&self.call_type),
                }
            }
            QueryKind::CustomerInsights => QueryRequest::CustomerInsights {
                segment: non_empty(&self.segment),
                plan_type: non_empty(&self.plan_type),
            },
            QueryKind::CombinedBehavior => QueryRequest::CombinedBehavior {
                month: self.month.clone(),
                limit: self.query_limit,
            },
        }
    }

    fn actions_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("actions")
            .resizable(false)
            .default_width(250.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.label(
                    egui::RichText::new("DATABASES")
                        .color(egui::Color32::from_rgb(150, 150, 150))
                        .size(10.0)
                        .strong(),
                );
                ui.add_space(4.0);

                ui.add_enabled_ui(!self.busy, |ui| {
                    if ui.button("Setup databases").clicked() {
                        self.spawn_api(ctx, "Setting up databases...", |api| {
                            WorkerResult::Setup(api.setup_databases())
                        });
                    }

                    ui.horizontal(|ui| {
                        ui.label("Export dir:");
                        ui.text_edit_singleline(&mut self.data_directory);
                    });

                    if ui.button("Load existing data").clicked() {
                        let dir = self.data_directory.clone();
                        self.spawn_api(ctx, "Loading existing data...", move |api| {
                            WorkerResult::LoadData(api.load_existing_data(&dir))
                        });
                    }

                    if ui.button("Verify data directory").clicked() {
                        let dir = self.data_directory.clone();
                        self.spawn_api(ctx, "Verifying data directory...", move |api| {
                            WorkerResult::Verify(api.verify_data_directory(&dir))
                        });
                    }

                    ui.add_space(8.0);
                    ui.separator();
                    ui.label(
                        egui::RichText::new("INDEXES")
                            .color(egui::Color32::from_rgb(150, 150, 150))
                            .size(10.0)
                            .strong(),
                    );
                    ui.add_space(4.0);

                    egui::ComboBox::from_id_salt("index_target")
                        .selected_text(self.index_target.as_str())
                        .show_ui(ui, |ui| {
                            for target in
                                [IndexTarget::Both, IndexTarget::Cassandra, IndexTarget::Mongodb]
                            {
                                ui.selectable_value(&mut self.index_target, target, target.as_str());
                            }
                        });

                    ui.horizontal(|ui| {
                        if ui.button("Create").clicked() {
                            let target = self.index_target;
                            self.spawn_api(ctx, "Creating indexes...", move |api| {
                                WorkerResult::Indexes {
                                    action: "Index creation",
                                    result: api.create_indexes(target),
                                }
                            });
                        }
                        if ui.button("Drop").clicked() {
                            let target = self.index_target;
                            self.spawn_api(ctx, "Dropping indexes...", move |api| {
                                WorkerResult::Indexes {
                                    action: "Index drop",
                                    result: api.drop_indexes(target),
                                }
                            });
                        }
                    });

                    if ui.button("Run performance test").clicked() {
                        self.spawn_api(ctx, "Starting performance comparison...", |api| {
                            WorkerResult::Performance(api.performance_test())
                        });
                    }

                    ui.add_space(8.0);
                    ui.separator();
                    ui.label(
                        egui::RichText::new("QUERIES")
                            .color(egui::Color32::from_rgb(150, 150, 150))
                            .size(10.0)
                            .strong(),
                    );
                    ui.add_space(4.0);

                    egui::ComboBox::from_id_salt("query_kind")
                        .selected_text(self.query_kind.label())
                        .show_ui(ui, |ui| {
                            for kind in [
                                QueryKind::CallAnalytics,
                                QueryKind::CustomerInsights,
                                QueryKind::CombinedBehavior,
                            ] {
                                ui.selectable_value(&mut self.query_kind, kind, kind.label());
                            }
                        });

                    match self.query_kind {
                        QueryKind::CallAnalytics => {
                            ui.horizontal(|ui| {
                                ui.label("Days:");
                                ui.add(egui::DragValue::new(&mut self.range_days).range(1..=365));
                            });
                            ui.horizontal(|ui| {
                                ui.label("Call type:");
                                ui.text_edit_singleline(&mut self.call_type);
                            });
                        }
                        QueryKind::CustomerInsights => {
                            ui.horizontal(|ui| {
                                ui.label("Segment:");
                                ui.text_edit_singleline(&mut self.segment);
                            });
                            ui.horizontal(|ui| {
                                ui.label("Plan type:");
                                ui.text_edit_singleline(&mut self.plan_type);
                            });
                        }
                        QueryKind::CombinedBehavior => {
                            ui.horizontal(|ui| {
                                ui.label("Month:");
                                ui.text_edit_singleline(&mut self.month);
                            });
                            ui.horizontal(|ui| {
                                ui.label("Limit:");
                                ui.add(egui::DragValue::new(&mut self.query_limit).range(1..=500));
                            });
                        }
                    }

                    if ui.button("Run query").clicked() {
                        let request = self.build_query_request();
                        let label = self.query_kind.label().to_string();
                        self.spawn_api(ctx, "Executing query...", move |api| WorkerResult::Query {
                            label,
                            result: api.execute_query(&request),
                        });
                    }
                });

                ui.add_space(8.0);
                ui.separator();

                if ui.button("Refresh status").clicked() {
                    self.supervisor.request_status();
                }
            });
    }

    fn central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            // Alerts stack at the top of the main content region
            self.alerts.ui(ui);

            ui.add_space(4.0);

            if !self.query_timings.is_empty() {
                ui.label(
                    egui::RichText::new("Query execution time (s)")
                        .color(egui::Color32::from_rgb(150, 150, 150))
                        .size(10.0)
                        .strong(),
                );
                build_timings_chart(&self.query_timings).show(ui);
                ui.add_space(8.0);
            }

            if let Some(chart) = &self.performance_chart {
                ui.label(
                    egui::RichText::new("Index improvement (%)")
                        .color(egui::Color32::from_rgb(150, 150, 150))
                        .size(10.0)
                        .strong(),
                );
                chart.show(ui);
                ui.add_space(8.0);
            }

            if let Some(summary) = &self.data_summary {
                egui::CollapsingHeader::new("Export directory")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "{}: {} of {} files present",
                                summary.directory, summary.files_found, summary.total_files
                            ))
                            .color(egui::Color32::from_rgb(180, 180, 180))
                            .size(10.0),
                        );
                        ui.add_space(4.0);

                        let mut files: Vec<&String> = summary.file_sizes.keys().collect();
                        files.sort();

                        egui::Grid::new("data_summary").striped(true).show(ui, |ui| {
                            for file in files {
                                ui.label(
                                    egui::RichText::new(file.as_str()).size(9.0).monospace(),
                                );
                                ui.label(
                                    egui::RichText::new(format::format_bytes(
                                        summary.file_sizes[file],
                                    ))
                                    .size(9.0),
                                );
                                // Record counts come back as a string when the
                                // backend failed to read the file.
                                let records = match summary.estimated_records.get(file) {
                                    Some(serde_json::Value::Number(n)) => n
                                        .as_i64()
                                        .map(|count| {
                                            format!("{} records", format::format_number(count))
                                        })
                                        .unwrap_or_else(|| n.to_string()),
                                    Some(serde_json::Value::String(s)) => s.clone(),
                                    Some(other) => other.to_string(),
                                    None => "—".to_string(),
                                };
                                ui.label(egui::RichText::new(records).size(9.0));
                                ui.end_row();
                            }
                        });
                    });
                ui.add_space(8.0);
            }

            if let Some((title, value)) = &self.last_result {
                egui::CollapsingHeader::new(title.as_str())
                    .default_open(false)
                    .show(ui, |ui| {
                        let pretty = serde_json::to_string_pretty(value)
                            .unwrap_or_else(|_| value.to_string());
                        egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(pretty)
                                    .size(9.0)
                                    .monospace(),
                            );
                        });
                    });
            }
        });
    }

    fn top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("Telco NoSQL Platform")
                        .color(egui::Color32::from_rgb(100, 180, 220))
                        .size(14.0)
                        .strong(),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let status = self.status.lock().unwrap();
                    // Timestamp display refreshed on every snapshot
                    if let Some(timestamp) = &status.last_timestamp {
                        ui.label(
                            egui::RichText::new(format::format_date(timestamp))
                                .color(egui::Color32::from_rgb(160, 160, 160))
                                .size(10.0)
                                .monospace(),
                        );
                    }

                    for service in status.services.iter().rev() {
                        let (text, color) = status_pane::indicator_visual(service.connected);
                        ui.label(egui::RichText::new(text).color(color).size(10.0));
                        ui.label(
                            egui::RichText::new(format!("{}:", service.name))
                                .color(egui::Color32::from_rgb(130, 130, 130))
                                .size(10.0),
                        );
                    }
                });
            });
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Global error events from the panic hook
        while let Ok(event) = self.ui_event_rx.try_recv() {
            match event {
                UiEvent::UnexpectedError => {
                    self.alerts
                        .push(AlertKind::Danger, "An unexpected error occurred");
                }
            }
        }

        // Completed background API calls
        while let Ok(result) = self.worker_rx.try_recv() {
            self.handle_worker_result(result);
        }

        // Backend progress events drive the modal while an operation runs
        if self.busy {
            let loading = self.status.lock().unwrap().loading.clone();
            if let Some(loading) = loading {
                self.loading.set_progress(&loading.message, loading.progress);
            }
        }

        self.top_panel(ctx);
        self.actions_panel(ctx);
        self.central_panel(ctx);

        {
            let status = self.status.lock().unwrap();
            self.status_pane.render(ctx, &status);
        }

        // Modal renders above everything else
        self.loading.ui(ctx);

        if self.status_pane.visible != self.config.status_pane_visible {
            self.config.status_pane_visible = self.status_pane.visible;
            if let Err(e) = self.config.save() {
                error!("Failed to save config: {}", e);
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn build_timings_chart(timings: &[(String, f64)]) -> ChartSpec {
    let values: Vec<f64> = timings.iter().map(|(_, secs)| *secs).collect();
    let labels: Vec<String> = timings.iter().map(|(label, _)| label.clone()).collect();

    ChartSpec::new(
        "query_timings",
        ChartKind::Bar,
        ChartData {
            series: vec![ChartSeries::from_values("execution time", &values)],
            x_labels: labels,
        },
    )
    .options(ChartOptions {
        height: Some(180.0),
        ..Default::default()
    })
}

fn build_performance_chart(results: &api::PerformanceResults) -> ChartSpec {
    let mut names: Vec<&String> = results.individual_queries.keys().collect();
    names.sort();

    let improvements: Vec<f64> = names
        .iter()
        .map(|name| results.individual_queries[*name].improvement_percent)
        .collect();
    let labels: Vec<String> = names.into_iter().cloned().collect();

    ChartSpec::new(
        "performance_improvement",
        ChartKind::Bar,
        ChartData {
            series: vec![ChartSeries::from_values("improvement", &improvements)],
            x_labels: labels,
        },
    )
    .options(ChartOptions {
        height: Some(180.0),
        ..Default::default()
    })
}
