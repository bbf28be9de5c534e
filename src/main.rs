use offload_model::{
    DeadlinePolicy, Discipline, Dist, EngineConfig, QueueEngine, Samplers, Sim, Source,
};

fn main() {
    tracing_subscriber::fmt::init();

    let config = EngineConfig {
        discipline: Discipline::DeadlinePriority,
        capacity: 10,
        deadline_policy: DeadlinePolicy::ShiftOnReconnect,
        channel_initially_up: false,
        seed: 0,
    };
    let samplers = Samplers {
        service: Dist::Exp { mean: 6.0 }.boxed().expect("service dist"),
        deadline: Dist::Exp { mean: 25.0 }.boxed().expect("deadline dist"),
        up_sojourn: Dist::Exp { mean: 45.0 }.boxed().expect("up sojourn dist"),
        down_sojourn: Dist::Exp { mean: 15.0 }.boxed().expect("down sojourn dist"),
    };

    let engine = QueueEngine::new(config, samplers).expect("engine config");
    let source = Source::new(0, 2000, Dist::Exp { mean: 8.0 }.boxed().expect("arrivals"), 1);
    let mut sim = Sim::new(engine, source);
    sim.run();

    println!("offered:            {}", sim.offered);
    println!("completed:          {}", sim.sink.completed.len());
    println!("dropped (deadline): {}", sim.sink.deadline_drops());
    println!("dropped (capacity): {}", sim.sink.capacity_drops());
    println!("max queue length:   {}", sim.sink.max_queue_len);
    println!("avg queueing time:  {:.2} ticks", sim.sink.mean_queueing_time());
    println!("avg service time:   {:.2} ticks", sim.sink.mean_service_time());
    println!("avg lifetime:       {:.2} ticks", sim.sink.mean_lifetime());
    println!("avg queue visits:   {:.2}", sim.sink.mean_queue_visits());
}
