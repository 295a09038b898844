pub mod tabular_q_learner;
