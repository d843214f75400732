export![builder, compositor, relighter, selector];
