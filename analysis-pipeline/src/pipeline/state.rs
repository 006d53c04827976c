use state_machines::state_machine;

state_machine! {
    name: AnalysisMachine,
    state: AnalysisState,
    initial: Ready,
    states: [Ready, Fetched, Filtered, Analyzed, Packaged],
    events {
        fetch { transition: { from: Ready, to: Fetched } }
        filter { transition: { from: Fetched, to: Filtered } }
        analyze { transition: { from: Filtered, to: Analyzed } }
        package { transition: { from: Analyzed, to: Packaged } }
    }
}

pub fn ready() -> AnalysisMachine<(), Ready> {
    AnalysisMachine::new(())
}
