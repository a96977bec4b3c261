use pomodroid_core::TimerState;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let rows: Vec<_> = TimerState::ALL
            .iter()
            .map(|state| {
                serde_json::json!({
                    "code": state.code(),
                    "name": state,
                    "title": state.title(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for state in TimerState::ALL {
            println!("{}  {:<9} {}", state.code(), state.as_str(), state.title());
        }
    }
    Ok(())
}
